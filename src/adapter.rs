//! Per-adapter collection: run the dialect's queries for one controller and
//! assemble its [`AdapterRecord`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::CommandRunner;
use crate::dialect::ReportParser;
use crate::error::Result;
use crate::model::{AdapterRecord, PhysicalDriveRecord, VirtualDriveRecord};

/// Raw controller event log of one adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerLog {
    pub adapter_id: u32,
    pub text: String,
}

/// Queries one controller through a utility, runner and dialect.
pub struct AdapterQuery<'a> {
    utility: &'a Path,
    runner: &'a dyn CommandRunner,
    parser: &'a dyn ReportParser,
}

impl<'a> AdapterQuery<'a> {
    pub fn new(
        utility: &'a Path,
        runner: &'a dyn CommandRunner,
        parser: &'a dyn ReportParser,
    ) -> Self {
        Self {
            utility,
            runner,
            parser,
        }
    }

    /// Run the virtual-drive query for `adapter` and parse its report.
    pub fn virtual_drives(&self, adapter: u32) -> Result<Vec<VirtualDriveRecord>> {
        let raw = self
            .runner
            .run(self.utility, &self.parser.volume_args(adapter))?;
        let report = self.parser.validate(&raw)?;
        self.parser.parse_virtual_drives(report)
    }

    /// Run the physical-drive query for `adapter` and parse its report.
    pub fn physical_drives(&self, adapter: u32) -> Result<Vec<PhysicalDriveRecord>> {
        let raw = self
            .runner
            .run(self.utility, &self.parser.drive_args(adapter))?;
        let report = self.parser.validate(&raw)?;
        self.parser.parse_physical_drives(report)
    }

    /// Both record kinds for `adapter`; any failure discards the adapter.
    pub fn collect(&self, adapter: u32) -> Result<AdapterRecord> {
        let virtual_drives = self.virtual_drives(adapter)?;
        let physical_drives = self.physical_drives(adapter)?;

        log::debug!(
            "adapter {}: {} virtual drives, {} physical drives",
            adapter,
            virtual_drives.len(),
            physical_drives.len()
        );

        Ok(AdapterRecord {
            adapter_id: adapter,
            virtual_drives,
            physical_drives,
        })
    }

    /// The controller's event log, unparsed.
    pub fn event_log(&self, adapter: u32) -> Result<ControllerLog> {
        let text = self
            .runner
            .run(self.utility, &self.parser.log_args(adapter))?;
        Ok(ControllerLog {
            adapter_id: adapter,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{KeyValueDialect, LinePolicy, TabularDialect};
    use crate::error::RaidError;
    use crate::testing::{ScriptedRunner, LDINFO, MFI_DRIVES, MFI_VOLUMES, PDLIST};

    const MEGACLI: &str = "/opt/MegaRAID/MegaCli/MegaCli64";

    #[test]
    fn test_collect_key_value_adapter() {
        let runner = ScriptedRunner::new()
            .reply("-ldinfo -lall -a0", LDINFO)
            .reply("-pdlist -a0", PDLIST);
        let parser = KeyValueDialect::megacli(LinePolicy::Lenient);
        let query = AdapterQuery::new(Path::new(MEGACLI), &runner, &parser);

        let adapter = query.collect(0).unwrap();
        assert_eq!(adapter.adapter_id, 0);
        assert_eq!(adapter.virtual_drives.len(), 2);
        assert_eq!(adapter.physical_drives.len(), 3);
        assert_eq!(runner.calls(), vec!["-ldinfo -lall -a0", "-pdlist -a0"]);
    }

    #[test]
    fn test_collect_tabular_adapter() {
        let runner = ScriptedRunner::new()
            .reply("-u 1 show volumes", MFI_VOLUMES)
            .reply("-u 1 show drives", MFI_DRIVES);
        let parser = TabularDialect::mfiutil().unwrap();
        let query = AdapterQuery::new(Path::new("/usr/sbin/mfiutil"), &runner, &parser);

        let adapter = query.collect(1).unwrap();
        assert_eq!(adapter.adapter_id, 1);
        assert_eq!(adapter.virtual_drives.len(), 3);
        assert_eq!(adapter.physical_drives.len(), 5);
    }

    #[test]
    fn test_tabular_output_is_not_validated() {
        // mfiutil prints no exit trailer; the key/value validator would reject it.
        let runner = ScriptedRunner::new().reply("-u 0 show volumes", MFI_VOLUMES);
        let parser = TabularDialect::mfiutil().unwrap();
        let query = AdapterQuery::new(Path::new("/usr/sbin/mfiutil"), &runner, &parser);
        assert_eq!(query.virtual_drives(0).unwrap().len(), 3);
    }

    #[test]
    fn test_drive_query_failure_discards_adapter() {
        let runner = ScriptedRunner::new().reply("-ldinfo -lall -a0", LDINFO);
        let parser = KeyValueDialect::megacli(LinePolicy::Lenient);
        let query = AdapterQuery::new(Path::new(MEGACLI), &runner, &parser);

        let err = query.collect(0).unwrap_err();
        assert!(matches!(err, RaidError::Invocation { .. }));
    }

    #[test]
    fn test_volume_query_failure_skips_drive_query() {
        let runner = ScriptedRunner::new()
            .reply("-ldinfo -lall -a0", "Exit Code: 0x01\n")
            .reply("-pdlist -a0", PDLIST);
        let parser = KeyValueDialect::megacli(LinePolicy::Lenient);
        let query = AdapterQuery::new(Path::new(MEGACLI), &runner, &parser);

        match query.collect(0).unwrap_err() {
            RaidError::CommandFailed(code) => assert_eq!(code, "0x01"),
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
        assert_eq!(runner.calls(), vec!["-ldinfo -lall -a0"]);
    }

    #[test]
    fn test_missing_exit_marker() {
        let truncated = &PDLIST[..PDLIST.find("Exit Code").unwrap()];
        let runner = ScriptedRunner::new().reply("-pdlist -a0", truncated);
        let parser = KeyValueDialect::megacli(LinePolicy::Lenient);
        let query = AdapterQuery::new(Path::new(MEGACLI), &runner, &parser);

        assert!(matches!(
            query.physical_drives(0),
            Err(RaidError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_event_log() {
        let runner = ScriptedRunner::new().reply("-fwtermlog -dsply -a2", "T0: fw log line\n");
        let parser = KeyValueDialect::megacli(LinePolicy::Strict);
        let query = AdapterQuery::new(Path::new(MEGACLI), &runner, &parser);

        let log = query.event_log(2).unwrap();
        assert_eq!(log.adapter_id, 2);
        assert_eq!(log.text, "T0: fw log line\n");
    }
}
