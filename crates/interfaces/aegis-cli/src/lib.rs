pub mod commands;
pub mod profiles;

use std::str::FromStr;

use aegis_core::{TaskSpec, TaskTag};
use anyhow::{anyhow, bail};

/// A task given on the command line as `TAG:CONFIG:PLATFORM[:clean]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskArg {
    pub tag: TaskTag,
    pub config: String,
    pub platform: String,
    pub clean: bool,
}

impl TaskArg {
    pub fn to_spec(&self) -> TaskSpec {
        TaskSpec::new(self.tag, &self.config, &self.platform).with_clean(self.clean)
    }
}

impl FromStr for TaskArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let (tag, config, platform, clean) = match parts.as_slice() {
            [tag, config, platform] => (tag, config, platform, false),
            [tag, config, platform, flag] if flag.eq_ignore_ascii_case("clean") => {
                (tag, config, platform, true)
            }
            [_, _, _, flag] => bail!("Unknown task flag '{flag}' (expected 'clean')"),
            _ => bail!("Expected TAG:CONFIG:PLATFORM[:clean], got '{s}'"),
        };
        let tag: TaskTag = tag.parse()?;
        if clean && !tag.supports_clean() {
            bail!("'{tag}' tasks have no output directory to clean");
        }
        if config.is_empty() || platform.is_empty() {
            bail!("Config and platform must not be empty in '{s}'");
        }
        Ok(Self {
            tag,
            config: config.to_string(),
            platform: platform.to_string(),
            clean,
        })
    }
}

/// `N=COMMAND`: replace the command of the N-th task (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOverrideArg {
    pub row: usize,
    pub command: String,
}

impl FromStr for CommandOverrideArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, command) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected N=COMMAND, got '{s}'"))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| anyhow!("Task number must be a positive integer, got '{index}'"))?;
        if index == 0 {
            bail!("Task numbers start at 1");
        }
        Ok(Self {
            row: index - 1,
            command: command.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_arg_parses_optional_clean() {
        let arg: TaskArg = "cook:Development:Win64:clean".parse().unwrap();
        assert_eq!(arg.tag, TaskTag::Cook);
        assert!(arg.clean);
        assert!(arg.to_spec().clean);

        let arg: TaskArg = "DDC-Rebuild:Shipping:Linux".parse().unwrap();
        assert_eq!(arg.tag, TaskTag::DdcRebuild);
        assert!(!arg.clean);
    }

    #[test]
    fn task_arg_rejects_bad_shapes() {
        assert!("cook:Development".parse::<TaskArg>().is_err());
        assert!("cook:Development:Win64:fast".parse::<TaskArg>().is_err());
        assert!("build:Development:Win64:clean".parse::<TaskArg>().is_err());
        assert!("deploy:Development:Win64".parse::<TaskArg>().is_err());
        assert!("cook::Win64".parse::<TaskArg>().is_err());
    }

    #[test]
    fn command_override_is_one_based() {
        let arg: CommandOverrideArg = "2= sh -c 'echo a=b' ".parse().unwrap();
        assert_eq!(arg.row, 1);
        assert_eq!(arg.command, "sh -c 'echo a=b'");
        assert!("0=x".parse::<CommandOverrideArg>().is_err());
        assert!("x".parse::<CommandOverrideArg>().is_err());
    }
}
