use std::{path::PathBuf, process::Command};

use log::{error, info};

use crate::error::{JournalError, Result, ToolStatus};

/// Builds the static site, then deploys it. Both must exit zero.
#[derive(Debug, Clone)]
pub(crate) struct Publisher {
    pub workdir: PathBuf,
    pub build: Vec<String>,
    pub deploy: Vec<String>,
}

impl Publisher {
    pub fn new(workdir: PathBuf, build: &str, deploy: &str) -> Self {
        Self {
            workdir,
            build: split_command(build),
            deploy: split_command(deploy),
        }
    }

    pub fn publish(&self) -> Result<()> {
        self.run(&self.build)?;
        self.run(&self.deploy)?;
        info!("site built and deployed");
        Ok(())
    }

    fn run(&self, argv: &[String]) -> Result<()> {
        let step = argv.join(" ");
        let failed = |status: ToolStatus| -> Result<()> {
            error!("`{step}` failed: {status}");
            Err(JournalError::ExternalTool {
                step: step.clone(),
                status,
            })
        };

        let Some((program, args)) = argv.split_first() else {
            return failed(ToolStatus::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command",
            )));
        };
        info!("running `{step}`");
        match Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .status()
        {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => failed(ToolStatus::Exited(status)),
            Err(e) => failed(ToolStatus::Spawn(e)),
        }
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
