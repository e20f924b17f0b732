use std::fmt;

use serde::{Deserialize, Serialize};

/// How a legacy query names its datasource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatasourceRef {
    Default,
    Id(i64),
    Uid(String),
    Name(String),
}

impl fmt::Display for DatasourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Id(id) => write!(f, "id {id}"),
            Self::Uid(uid) => write!(f, "uid {uid}"),
            Self::Name(name) => write!(f, "name {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datasource {
    pub id: i64,
    pub org_id: i64,
    pub uid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_default: bool,
}
