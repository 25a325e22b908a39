//! Genesis state of the issue module.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    types::{validate_denom, IssueParams, Params},
    Address, IssueError,
};

/// A token as recorded in genesis.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CoinIssue {
    pub denom: String,
    pub owner: String,
    pub issuer: String,
    #[serde(flatten)]
    pub params: IssueParams,
}

impl CoinIssue {
    fn validate(&self) -> Result<(), IssueError> {
        validate_denom(&self.denom)?;
        for (field, value) in [("owner", &self.owner), ("issuer", &self.issuer)] {
            value
                .parse::<Address>()
                .map_err(|e| IssueError::InvalidAddress(format!("{field}: {e}")))?;
        }
        self.params.validate()
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub issues: Vec<CoinIssue>,
}

impl Default for GenesisState {
    fn default() -> Self {
        default_genesis()
    }
}

/// Default fee params and no tokens.
pub fn default_genesis() -> GenesisState {
    GenesisState {
        params: Params::default(),
        issues: vec![],
    }
}

/// Fee errors are returned unchanged, a repeated denom is [IssueError::IssueAlreadyExists],
/// any other problem with a token becomes [IssueError::InvalidGenesis].
pub fn validate_genesis(state: &GenesisState) -> Result<(), IssueError> {
    state.params.validate()?;
    let mut seen = HashSet::new();
    for issue in &state.issues {
        if !seen.insert(issue.denom.as_str()) {
            return Err(IssueError::IssueAlreadyExists);
        }
        issue
            .validate()
            .map_err(|e| IssueError::InvalidGenesis(format!("token {:?}: {e}", issue.denom)))?;
    }
    Ok(())
}
