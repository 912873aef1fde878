//! Fund catalog offered by the manual fund picker.
//!
//! The picker widget owns which ids it sends, so unknown ids are accepted
//! and displayed as-is.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FundCategory {
    UsEquity,
    SmallMidCap,
    International,
    Bonds,
    Cash,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Fund {
    pub id: &'static str,
    pub name: &'static str,
    pub category: FundCategory,
}

/// One fund per category.
pub const CATALOG: [Fund; 5] = [
    Fund {
        id: "us-lg",
        name: "U.S. Large Cap Index",
        category: FundCategory::UsEquity,
    },
    Fund {
        id: "us-sm",
        name: "U.S. Small/Mid Cap Index",
        category: FundCategory::SmallMidCap,
    },
    Fund {
        id: "intl-dev",
        name: "International Developed Markets",
        category: FundCategory::International,
    },
    Fund {
        id: "bond-ag",
        name: "U.S. Aggregate Bond Index",
        category: FundCategory::Bonds,
    },
    Fund {
        id: "stable",
        name: "Stable Value",
        category: FundCategory::Cash,
    },
];

pub fn find(id: &str) -> Option<&'static Fund> {
    CATALOG.iter().find(|f| f.id.eq_ignore_ascii_case(id))
}

/// Display name for a fund id; unknown ids render as themselves.
pub fn fund_name(id: &str) -> &str {
    match find(id) {
        Some(fund) => fund.name,
        None => id,
    }
}
