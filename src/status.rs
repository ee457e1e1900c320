//! Status aggregation across adapters
//!
//! [`StatusMonitor`] owns the configuration, the runner and the dialect
//! parser, and holds the last [`StatusSnapshot`]. Every refresh rebuilds the
//! snapshot from scratch; a failure on any adapter leaves it empty.
//!
//! # Examples
//!
//! ```no_run
//! use raidlib::{MonitorConfig, StatusMonitor};
//!
//! let mut monitor = StatusMonitor::new(MonitorConfig::default())?;
//! let broken = monitor.list_broken()?;
//! for vd in &broken.volumes {
//!     println!("volume {} is {}", vd.index, vd.state);
//! }
//! # Ok::<(), raidlib::RaidError>(())
//! ```

use crate::adapter::{AdapterQuery, ControllerLog};
use crate::command::{CommandRunner, SystemRunner};
use crate::config::{clean_path, MonitorConfig};
use crate::dialect::ReportParser;
use crate::error::{RaidError, Result};
use crate::model::{AdapterRecord, BrokenDrives, StatusSnapshot};

/// Which record kinds a refresh queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    VirtualDrives,
    PhysicalDrives,
}

/// Queries every configured adapter and keeps the resulting snapshot
pub struct StatusMonitor {
    config: MonitorConfig,
    runner: Box<dyn CommandRunner>,
    parser: Box<dyn ReportParser>,
    snapshot: StatusSnapshot,
}

impl StatusMonitor {
    /// Create a monitor that spawns the configured utility.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::with_runner(config, Box::new(SystemRunner))
    }

    /// Create a monitor with a custom runner and the configured dialect.
    pub fn with_runner(config: MonitorConfig, runner: Box<dyn CommandRunner>) -> Result<Self> {
        let parser = config.dialect.parser(config.line_policy)?;
        Self::with_parts(config, runner, parser)
    }

    /// Create a monitor from explicit parts.
    ///
    /// The utility path is normalised and must exist.
    pub fn with_parts(
        mut config: MonitorConfig,
        runner: Box<dyn CommandRunner>,
        parser: Box<dyn ReportParser>,
    ) -> Result<Self> {
        config.utility_path = clean_path(&config.utility_path);
        if !config.utility_path.exists() {
            return Err(RaidError::UtilityNotFound(config.utility_path));
        }

        let snapshot = StatusSnapshot::new(config.utility_path.clone(), config.adapter_count);
        Ok(Self {
            config,
            runner,
            parser,
            snapshot,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Last snapshot; empty before the first successful refresh.
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Rebuild the snapshot from every adapter.
    pub fn refresh(&mut self) -> Result<&StatusSnapshot> {
        self.rebuild(Scope::All)
    }

    /// Rebuild the snapshot querying virtual drives only.
    pub fn refresh_virtual_drives(&mut self) -> Result<&StatusSnapshot> {
        self.rebuild(Scope::VirtualDrives)
    }

    /// Rebuild the snapshot querying physical drives only.
    pub fn refresh_physical_drives(&mut self) -> Result<&StatusSnapshot> {
        self.rebuild(Scope::PhysicalDrives)
    }

    /// Refresh, then report the drives that are not healthy.
    pub fn list_broken(&mut self) -> Result<BrokenDrives> {
        Ok(self.refresh()?.broken())
    }

    /// Event logs of every adapter whose log query succeeds.
    pub fn controller_logs(&self) -> Vec<ControllerLog> {
        let query = self.query();
        (0..self.config.adapter_count)
            .filter_map(|adapter| match query.event_log(adapter) {
                Ok(log) => Some(log),
                Err(e) => {
                    log::warn!("skipping event log of adapter {}: {}", adapter, e);
                    None
                }
            })
            .collect()
    }

    fn query(&self) -> AdapterQuery<'_> {
        AdapterQuery::new(
            &self.config.utility_path,
            self.runner.as_ref(),
            self.parser.as_ref(),
        )
    }

    fn rebuild(&mut self, scope: Scope) -> Result<&StatusSnapshot> {
        self.snapshot.adapters.clear();
        log::debug!(
            "refreshing {} adapter(s) via {} ({:?})",
            self.config.adapter_count,
            self.config.utility_path.display(),
            scope
        );

        let query = self.query();
        let adapters = (0..self.config.adapter_count)
            .map(|adapter| match scope {
                Scope::All => query.collect(adapter),
                Scope::VirtualDrives => Ok(AdapterRecord {
                    virtual_drives: query.virtual_drives(adapter)?,
                    ..AdapterRecord::new(adapter)
                }),
                Scope::PhysicalDrives => Ok(AdapterRecord {
                    physical_drives: query.physical_drives(adapter)?,
                    ..AdapterRecord::new(adapter)
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        self.snapshot.adapters = adapters;
        log::debug!("refresh complete");
        Ok(&self.snapshot)
    }
}
