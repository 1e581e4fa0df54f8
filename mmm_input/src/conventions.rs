//! Infers the marketing channels and the control covariates of an upload from
//! its column names alone.

use log::{debug, warn};

pub use crate::config::*;

/// What the column names of an upload declare.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ResolvedColumns {
    /// The channels, in the order their spend column first appears.
    pub channels: Vec<ChannelSpec>,
    /// The control covariates, in the order of the upload.
    pub control_columns: Vec<String>,
}

impl ResolvedColumns {
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    pub fn spend_columns(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.spend_column.clone()).collect()
    }

    /// The impression columns that exist, in channel order.
    pub fn impression_columns(&self) -> Vec<String> {
        self.channels
            .iter()
            .filter_map(|c| c.impression_column.clone())
            .collect()
    }
}

/// Resolves the columns with the default conventions.
///
/// This never fails: an upload without any `*_spend` column simply has no
/// channel, which the input builder will refuse later on.
pub fn resolve_columns(column_names: &[String]) -> ResolvedColumns {
    resolve_columns_with(column_names, &Conventions::DEFAULT)
}

pub fn resolve_columns_with(column_names: &[String], conv: &Conventions) -> ResolvedColumns {
    let mut channels: Vec<ChannelSpec> = Vec::new();
    for col in column_names {
        let name = match col.strip_suffix(conv.spend_suffix) {
            Some(name) => name,
            None => continue,
        };
        if name.is_empty() {
            warn!("resolve_columns: column {:?} has no channel name, skipping", col);
            continue;
        }
        if channels.iter().any(|c| c.name == name) {
            debug!("resolve_columns: channel {:?} already declared", name);
            continue;
        }
        let impression = conv.impression_column(name);
        let impression_column = if column_names.contains(&impression) {
            Some(impression)
        } else {
            None
        };
        debug!(
            "resolve_columns: channel {:?} spend: {:?} impressions: {:?}",
            name, col, impression_column
        );
        channels.push(ChannelSpec {
            name: name.to_string(),
            spend_column: col.clone(),
            impression_column,
        });
    }

    let control_columns: Vec<String> = column_names
        .iter()
        .filter(|col| col.contains(conv.control_marker))
        .cloned()
        .collect();
    debug!("resolve_columns: controls: {:?}", control_columns);

    ResolvedColumns {
        channels,
        control_columns,
    }
}
