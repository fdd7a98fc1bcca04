use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Action, GlueAction, S3Action};

/// A coarse permission of the target lake grant model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantVerb {
    /// Read table data
    Select,
    /// Change table or database metadata
    Alter,
    /// Drop a table or database
    Drop,
    /// Delete table data
    Delete,
    /// Write table data
    Insert,
    /// Read table or database metadata
    Describe,
    /// Every permission on the resource
    Super,
    /// Create databases in a catalog
    CreateDatabase,
    /// Create tables in a database
    CreateTable,
    /// Register data at a storage location
    DataLocationAccess,
    /// Create tags
    CreateLfTag,
    /// Associate tags with resources
    Associate,
    /// Grant through a tag expression
    GrantWithLfTagExpression,
    /// List the databases of a catalog
    ListDbs,
    /// List one database
    ListDb,
}

impl GrantVerb {
    /// Every verb of the target model
    pub const ALL: [GrantVerb; 15] = [
        GrantVerb::Select,
        GrantVerb::Alter,
        GrantVerb::Drop,
        GrantVerb::Delete,
        GrantVerb::Insert,
        GrantVerb::Describe,
        GrantVerb::Super,
        GrantVerb::CreateDatabase,
        GrantVerb::CreateTable,
        GrantVerb::DataLocationAccess,
        GrantVerb::CreateLfTag,
        GrantVerb::Associate,
        GrantVerb::GrantWithLfTagExpression,
        GrantVerb::ListDbs,
        GrantVerb::ListDb,
    ];

    /// The verb as it is written in grants, e.g. `CREATE_TABLE`
    pub fn name(&self) -> &'static str {
        match self {
            GrantVerb::Select => "SELECT",
            GrantVerb::Alter => "ALTER",
            GrantVerb::Drop => "DROP",
            GrantVerb::Delete => "DELETE",
            GrantVerb::Insert => "INSERT",
            GrantVerb::Describe => "DESCRIBE",
            GrantVerb::Super => "SUPER",
            GrantVerb::CreateDatabase => "CREATE_DATABASE",
            GrantVerb::CreateTable => "CREATE_TABLE",
            GrantVerb::DataLocationAccess => "DATA_LOCATION_ACCESS",
            GrantVerb::CreateLfTag => "CREATE_LF_TAG",
            GrantVerb::Associate => "ASSOCIATE",
            GrantVerb::GrantWithLfTagExpression => "GRANT_WITH_LF_TAG_EXPRESSION",
            GrantVerb::ListDbs => "LIST_DBS",
            GrantVerb::ListDb => "LIST_DB",
        }
    }

    /// Look up a verb by its written name
    pub fn parse(name: &str) -> Option<GrantVerb> {
        Self::ALL.iter().copied().find(|verb| verb.name() == name)
    }
}

impl Display for GrantVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl GlueAction {
    /// The verb this action translates to, if any
    pub fn grant_verb(&self) -> Option<GrantVerb> {
        match self {
            GlueAction::GetDatabases => Some(GrantVerb::ListDbs),
            GlueAction::CreateDatabase => Some(GrantVerb::CreateDatabase),

            GlueAction::GetDatabase | GlueAction::GetTables => Some(GrantVerb::Describe),
            GlueAction::DeleteDatabase => Some(GrantVerb::Drop),
            GlueAction::UpdateDatabase => Some(GrantVerb::Alter),
            GlueAction::CreateTable => Some(GrantVerb::CreateTable),

            GlueAction::UpdateTable
            | GlueAction::DeleteTableVersion
            | GlueAction::BatchDeleteTableVersion
            | GlueAction::CreatePartition
            | GlueAction::UpdatePartition
            | GlueAction::DeletePartition
            | GlueAction::BatchCreatePartition
            | GlueAction::BatchUpdatePartition
            | GlueAction::BatchDeletePartition => Some(GrantVerb::Alter),
            GlueAction::DeleteTable => Some(GrantVerb::Drop),
            GlueAction::GetTable
            | GlueAction::GetPartition
            | GlueAction::GetPartitions
            | GlueAction::BatchGetPartition
            | GlueAction::GetPartitionIndexes => Some(GrantVerb::Describe),

            GlueAction::GetTableVersion
            | GlueAction::GetTableVersions
            | GlueAction::CreatePartitionIndex
            | GlueAction::DeletePartitionIndex => None,
        }
    }
}

impl S3Action {
    /// The verb this action translates to on the tables that own the data
    pub fn grant_verb(&self) -> Option<GrantVerb> {
        match self {
            S3Action::GetObject | S3Action::HeadObject => Some(GrantVerb::Select),
            S3Action::PutObject | S3Action::CreateMultipartUpload | S3Action::UploadPart => {
                Some(GrantVerb::Insert)
            }
            S3Action::DeleteObject => Some(GrantVerb::Delete),
        }
    }
}

impl Action {
    /// The verb this action translates to, if any
    pub fn grant_verb(&self) -> Option<GrantVerb> {
        match self {
            Action::Glue(action) => action.grant_verb(),
            Action::S3(action) => action.grant_verb(),
        }
    }
}
