//! Re-opens the session list after a mutation.
use tracing::debug;

use crate::terminal::automation::{ScriptError, ScriptRunner, applescript_string};

const ALFRED_BUNDLE_ID: &str = "com.runningwithcrayons.Alfred";

pub trait Refresher {
    fn refresh(&self) -> Result<(), ScriptError>;
}

/// Re-runs the launcher search for the list keyword so it shows the current
/// session table.
pub struct AlfredRefresher<'a> {
    runner: &'a dyn ScriptRunner,
    keyword: String,
}

impl<'a> AlfredRefresher<'a> {
    pub fn new(runner: &'a dyn ScriptRunner, keyword: &str) -> Self {
        Self {
            runner,
            keyword: keyword.trim().to_string(),
        }
    }

    pub fn script(&self) -> String {
        format!(
            "tell application id \"{}\" to search {}",
            ALFRED_BUNDLE_ID,
            applescript_string(&format!("{} ", self.keyword))
        )
    }
}

impl Refresher for AlfredRefresher<'_> {
    fn refresh(&self) -> Result<(), ScriptError> {
        if self.keyword.is_empty() {
            debug!("refresh disabled");
            return Ok(());
        }

        self.runner.run(&self.script())?;
        Ok(())
    }
}
