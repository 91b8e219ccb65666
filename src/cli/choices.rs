use crate::cli::{FilterArgs, SourceArgs};
use crate::error::Result;
use crate::filters::LocationChoices;
use crate::settings::load_settings;

pub fn run(source: &SourceArgs, filters: &FilterArgs) -> Result<()> {
    let settings = load_settings();
    let dataset = source.open(&settings)?;
    let request = filters.request(dataset)?;
    println!("{}", format_choices(&request.choices(dataset)));
    Ok(())
}

pub fn format_choices(choices: &LocationChoices) -> String {
    let section = |title: &str, values: &[String]| {
        let mut s = format!("{title} ({})\n", values.len());
        for v in values {
            s.push_str(&format!("  {v}\n"));
        }
        s
    };
    format!(
        "{}\n{}\n{}",
        section("Regions", &choices.regions),
        section("States", &choices.states),
        section("Cities", &choices.cities),
    )
    .trim_end()
    .to_string()
}
