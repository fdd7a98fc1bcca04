//! Source permission documents and the statements they contain.
//!
//! Documents deserialize from the provider's JSON shape. Only the fields
//! the resolver needs are modeled; anything else (conditions, statement
//! ids, `NotAction`) is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::LakegrantEngineError;

const PRINCIPAL_KEY: &str = "AWS";

/// A JSON value that may be written either as one item or as a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item
    One(T),
    /// A list of items
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    /// The items as a list
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// A permission document: an identity policy attached to a principal, or a
/// resource policy attached to a bucket or catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// The policy language version
    #[serde(default)]
    pub version: Option<String>,
    /// The statements of the document
    #[serde(default)]
    pub statement: OneOrMany<RawStatement>,
}

impl PolicyDocument {
    /// The statements of the document, in document order
    pub fn statements(&self) -> Vec<RawStatement> {
        self.statement.clone().into_vec()
    }
}

/// The `Principal` element of a resource policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrincipalBlock {
    /// A bare principal, usually `*`
    Any(String),
    /// Principals keyed by kind (`AWS`, `Service`, ...)
    Keyed(BTreeMap<String, OneOrMany<String>>),
}

impl PrincipalBlock {
    /// The account principals named by this block. Only the `AWS` entry
    /// names account principals; a bare `*` stands for every principal.
    pub fn principals(&self) -> Vec<String> {
        match self {
            PrincipalBlock::Any(principal) => vec![principal.clone()],
            PrincipalBlock::Keyed(entries) => entries
                .get(PRINCIPAL_KEY)
                .cloned()
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
        }
    }
}

/// One statement as it was written. Every field is optional here; see
/// [`Statement`] for the validated form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawStatement {
    /// Optional statement id
    #[serde(default)]
    pub sid: Option<String>,
    /// `Allow` or `Deny`
    #[serde(default)]
    pub effect: Option<String>,
    /// Action patterns
    #[serde(default)]
    pub action: Option<OneOrMany<String>>,
    /// Resource patterns
    #[serde(default)]
    pub resource: Option<OneOrMany<String>>,
    /// The principals of a resource policy statement
    #[serde(default)]
    pub principal: Option<PrincipalBlock>,
}

/// Whether a statement grants or retracts access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Grants access
    Allow,
    /// Retracts access, regardless of where the matching allow appears
    Deny,
}

/// A validated statement with its effect, principal, resource and action
/// patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Whether the statement grants or retracts
    pub effect: Effect,
    /// Principal identifiers; `*` stands for every known principal
    pub principals: Vec<String>,
    /// Resource patterns
    pub resources: Vec<String>,
    /// Action patterns
    pub actions: Vec<String>,
}

impl Statement {
    /// A statement on behalf of one principal
    pub fn new<S: Into<String>>(
        effect: Effect,
        principal: &str,
        resources: impl IntoIterator<Item = S>,
        actions: impl IntoIterator<Item = S>,
    ) -> Self {
        Statement {
            effect,
            principals: vec![principal.to_owned()],
            resources: resources.into_iter().map(Into::into).collect(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Replace the principals of the statement
    pub fn with_principals(mut self, principals: Vec<String>) -> Self {
        self.principals = principals;
        self
    }
}

impl TryFrom<RawStatement> for Statement {
    type Error = LakegrantEngineError;

    fn try_from(raw: RawStatement) -> Result<Self, Self::Error> {
        let effect = match raw.effect.as_deref() {
            Some("Allow") => Effect::Allow,
            Some("Deny") => Effect::Deny,
            Some(other) => {
                return Err(LakegrantEngineError::InvalidStatement(format!(
                    "Unknown effect \"{other}\""
                )));
            }
            None => {
                return Err(LakegrantEngineError::InvalidStatement(
                    "Statement has no effect".into(),
                ));
            }
        };

        let actions = raw.action.map(OneOrMany::into_vec).ok_or_else(|| {
            LakegrantEngineError::InvalidStatement("Statement has no action".into())
        })?;
        let resources = raw.resource.map(OneOrMany::into_vec).ok_or_else(|| {
            LakegrantEngineError::InvalidStatement("Statement has no resource".into())
        })?;

        Ok(Statement {
            effect,
            principals: raw
                .principal
                .map(|principal| principal.principals())
                .unwrap_or_default(),
            resources,
            actions,
        })
    }
}
