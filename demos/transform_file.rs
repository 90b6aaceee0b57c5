use std::path::PathBuf;

use access_transformer::RuleSet;

/// Usage: transform_file <rules.cfg> <In.class> [Out.class]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(rules_path), Some(class_path)) = (args.next(), args.next()) else {
        eprintln!("usage: transform_file <rules.cfg> <In.class> [Out.class]");
        std::process::exit(2);
    };
    let out_path = args.next().unwrap_or_else(|| class_path.clone());

    let ruleset = RuleSet::from_file(&rules_path)?;
    println!("loaded {ruleset}");

    let input = std::fs::read(&class_path)?;
    let report = ruleset.transform_class_detailed(&input)?;

    println!("{report}");
    for change in report.changes() {
        println!(
            "  {}: {:#06x} -> {:#06x}",
            change.element, change.old_flags, change.new_flags
        );
    }
    for denied in report.denied_downgrades() {
        println!(
            "  kept {} {} (asked for {})",
            denied.element, denied.downgrade.current, denied.downgrade.requested
        );
    }

    if !report.is_unchanged() {
        std::fs::write(&out_path, report.bytes())?;
        println!("wrote {}", out_path.display());
    }
    Ok(())
}
