use std::io::BufRead;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgMatches, Command};
use stdinout::Input;

use crate::telemetry::{LogDirOption, TelemetrySettings};
use crate::traits::{TelemetryApp, TelemetryOption};

const INPUT: &str = "INPUT";

pub struct ScalarsApp {
    input: Option<String>,
    telemetry: TelemetrySettings,
}

#[derive(Debug, PartialEq)]
struct Scalar {
    tag: String,
    step: i64,
    value: f32,
}

/// Parse a `tag<TAB>step<TAB>value` line.
///
/// Returns `None` for blank lines and comments.
fn parse_scalar_line(line: &str) -> Result<Option<Scalar>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split('\t');
    let (tag, step, value) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(tag), Some(step), Some(value), None) => (tag, step, value),
        _ => bail!("expected three tab-separated fields: tag, step, value"),
    };

    if tag.is_empty() {
        bail!("tag must not be empty");
    }

    Ok(Some(Scalar {
        tag: tag.to_string(),
        step: step
            .trim()
            .parse()
            .context(format!("Cannot parse step: {}", step))?,
        value: value
            .trim()
            .parse()
            .context(format!("Cannot parse value: {}", value))?,
    }))
}

impl TelemetryApp for ScalarsApp {
    fn app() -> Command {
        let app = Command::new("scalars")
            .about("Log scalars from tab-separated tag, step, and value lines")
            .arg(
                Arg::new(INPUT)
                    .help("Input scalars, read from stdin when absent")
                    .index(1),
            );

        LogDirOption::add_to_app(app)
    }

    fn parse(matches: &ArgMatches) -> Result<Self> {
        let input = matches.get_one::<String>(INPUT).cloned();
        let telemetry = LogDirOption::parse(matches)?;

        Ok(ScalarsApp { input, telemetry })
    }

    fn run(&self) -> Result<()> {
        let input = Input::from(self.input.as_ref());
        let reader = input
            .buf_read()
            .context("Cannot open scalars for reading")?;

        let n_scalars = self.telemetry.open()?.scoped(|writer| -> Result<usize> {
            let mut n_scalars = 0;

            for (idx, line) in reader.lines().enumerate() {
                let line = line.context("Cannot read scalars")?;
                let scalar = match parse_scalar_line(&line)
                    .context(format!("Invalid scalar on line {}", idx + 1))?
                {
                    Some(scalar) => scalar,
                    None => continue,
                };

                writer
                    .write_scalar(&scalar.tag, scalar.step, scalar.value)
                    .context(format!("Cannot write scalar {}", scalar.tag))?;
                n_scalars += 1;
            }

            Ok(n_scalars)
        })?;

        log::info!("Read {} scalars", n_scalars);

        Ok(())
    }
}
