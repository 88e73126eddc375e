use blockplan_core::Fixture;
use clap::Args;
use serde_json::json;

#[derive(Args)]
pub struct FixtureArgs {
    /// Fixture name
    #[arg(default_value = "a1")]
    pub name: String,
    /// List available fixtures instead of running one
    #[arg(long)]
    pub list: bool,
}

pub fn run(args: FixtureArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.list {
        for name in Fixture::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let fixture = Fixture::by_name(&args.name).ok_or_else(|| {
        format!("unknown fixture: {} (available: {})", args.name, Fixture::names().join(", "))
    })?;
    let outcome = fixture.run()?;

    let output = json!({
        "fixture": fixture.name,
        "version": fixture.version,
        "input": {
            "free_slots": fixture.free_slots,
            "goals": fixture.goals,
        },
        "outcome": outcome,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
