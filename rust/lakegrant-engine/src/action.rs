//! The closed vocabulary of source actions the engine understands.

use std::fmt::Display;

use lakegrant_resource::{Resource, Service, WILDCARD};

/// The resource level at which an action is meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    /// Actions on a whole catalog, such as creating databases
    Catalog,
    /// Actions on one database
    Database,
    /// Actions on one table, its versions or its partitions
    Table,
    /// Object-store actions; the store has a single flat level
    Storage,
}

impl Granularity {
    /// The granularity of a classified resource, or `None` for
    /// [`Resource::Unknown`]
    pub fn of(resource: &Resource) -> Option<Granularity> {
        match resource {
            Resource::Catalog(_) => Some(Granularity::Catalog),
            Resource::Database(_) => Some(Granularity::Database),
            Resource::Table(_) => Some(Granularity::Table),
            Resource::Bucket(_) | Resource::Object(_) => Some(Granularity::Storage),
            Resource::Unknown => None,
        }
    }
}

macro_rules! service_actions {
    ( $enum:ident, $service:ident, { $( $variant:ident => $granularity:ident ),* $(,)? } ) => {
        #[doc = concat!("Every supported `", stringify!($service), "` action")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $enum {
            $(
                #[doc = concat!("`", stringify!($variant), "`")]
                $variant,
            )*
        }

        impl $enum {
            /// Every action of the service, in declaration order
            pub const ALL: &'static [$enum] = &[ $( $enum::$variant, )* ];

            /// The service that owns these actions
            pub const SERVICE: Service = Service::$service;

            /// The bare action name, without the service prefix
            pub fn name(&self) -> &'static str {
                match self {
                    $( $enum::$variant => stringify!($variant), )*
                }
            }

            /// The resource level this action applies to
            pub fn granularity(&self) -> Granularity {
                match self {
                    $( $enum::$variant => Granularity::$granularity, )*
                }
            }

            /// Look up an action by its bare name
            pub fn named(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|action| action.name() == name)
            }
        }

        impl Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}:{}", Self::SERVICE, self.name())
            }
        }
    };
}

service_actions!(GlueAction, Glue, {
    GetDatabase => Database,
    CreateDatabase => Catalog,
    UpdateDatabase => Database,
    DeleteDatabase => Database,
    GetDatabases => Catalog,
    GetTables => Database,
    GetTable => Table,
    CreateTable => Database,
    UpdateTable => Table,
    DeleteTable => Table,
    GetTableVersion => Table,
    GetTableVersions => Table,
    DeleteTableVersion => Table,
    BatchDeleteTableVersion => Table,
    BatchCreatePartition => Table,
    GetPartition => Table,
    GetPartitions => Table,
    BatchGetPartition => Table,
    CreatePartition => Table,
    DeletePartition => Table,
    BatchDeletePartition => Table,
    UpdatePartition => Table,
    BatchUpdatePartition => Table,
    GetPartitionIndexes => Table,
    CreatePartitionIndex => Table,
    DeletePartitionIndex => Table,
});

service_actions!(S3Action, S3, {
    GetObject => Storage,
    HeadObject => Storage,
    PutObject => Storage,
    CreateMultipartUpload => Storage,
    UploadPart => Storage,
    DeleteObject => Storage,
});

/// A fully qualified action of a supported service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// A catalog-service action
    Glue(GlueAction),
    /// An object-store action
    S3(S3Action),
}

impl Action {
    /// Parse a `service:Name` action. Returns `None` for unknown services
    /// and for names outside the vocabulary.
    pub fn parse(action: &str) -> Option<Action> {
        let (service, name) = action.split_once(':')?;
        match service.parse::<Service>().ok()? {
            Service::Glue => GlueAction::named(name).map(Action::Glue),
            Service::S3 => S3Action::named(name).map(Action::S3),
        }
    }

    /// The service that owns this action
    pub fn service(&self) -> Service {
        match self {
            Action::Glue(_) => GlueAction::SERVICE,
            Action::S3(_) => S3Action::SERVICE,
        }
    }

    /// The resource level this action applies to
    pub fn granularity(&self) -> Granularity {
        match self {
            Action::Glue(action) => action.granularity(),
            Action::S3(action) => action.granularity(),
        }
    }

    /// The bare action name, without the service prefix
    pub fn name(&self) -> &'static str {
        match self {
            Action::Glue(action) => action.name(),
            Action::S3(action) => action.name(),
        }
    }

    /// Every action of one service
    pub fn of_service(service: Service) -> Vec<Action> {
        match service {
            Service::Glue => GlueAction::ALL.iter().copied().map(Action::Glue).collect(),
            Service::S3 => S3Action::ALL.iter().copied().map(Action::S3).collect(),
        }
    }

    /// Every action of every supported service
    pub fn all() -> Vec<Action> {
        Service::ALL
            .iter()
            .flat_map(|service| Action::of_service(*service))
            .collect()
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Glue(action) => action.fmt(f),
            Action::S3(action) => action.fmt(f),
        }
    }
}

/// Expand an action pattern from a policy statement into the concrete
/// actions it grants.
///
/// `*` on its own stands for every action of every supported service. A
/// `service:pattern` expands to the actions of that service whose names
/// match the pattern in full, where `*` matches any run of characters.
/// Patterns of unknown services expand to nothing.
///
/// ```rust
/// # use lakegrant_engine::{Action, GlueAction, expand_action_pattern};
/// assert_eq!(
///     expand_action_pattern("glue:GetTable*"),
///     vec![
///         Action::Glue(GlueAction::GetTables),
///         Action::Glue(GlueAction::GetTable),
///         Action::Glue(GlueAction::GetTableVersion),
///         Action::Glue(GlueAction::GetTableVersions),
///     ]
/// );
/// assert!(expand_action_pattern("dynamodb:*").is_empty());
/// ```
pub fn expand_action_pattern(pattern: &str) -> Vec<Action> {
    if pattern == WILDCARD {
        return Action::all();
    }

    let Some((service, fragment)) = pattern.split_once(':') else {
        tracing::debug!("Ignoring action pattern \"{pattern}\" without a service");
        return Vec::new();
    };

    let Ok(service) = service.parse::<Service>() else {
        tracing::debug!("Ignoring action pattern \"{pattern}\" of an unsupported service");
        return Vec::new();
    };

    Action::of_service(service)
        .into_iter()
        .filter(|action| wildcard_matches(fragment, action.name()))
        .collect()
}

/// Returns true if `candidate` matches `pattern` in full, where every `*`
/// in the pattern matches any run of characters (including none).
/// Matching is case sensitive.
pub fn wildcard_matches(pattern: &str, candidate: &str) -> bool {
    let mut parts = pattern.split('*');

    // `split` always yields at least one part
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };

    let mut parts: Vec<&str> = parts.collect();
    let Some(last) = parts.pop() else {
        // No `*` at all: the whole candidate must have been consumed
        return rest.is_empty();
    };

    for part in parts {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}
