use anyhow::Result;
use clap::{ArgMatches, Command};

pub trait TelemetryApp
where
    Self: Sized,
{
    fn app() -> Command;

    fn parse(matches: &ArgMatches) -> Result<Self>;

    fn run(&self) -> Result<()>;
}

pub trait TelemetryOption {
    type Value;

    fn add_to_app(app: Command) -> Command;

    fn parse(matches: &ArgMatches) -> Result<Self::Value>;
}
