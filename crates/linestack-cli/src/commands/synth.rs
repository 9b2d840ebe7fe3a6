use anyhow::bail;

use linestack_synth::report::format_report;
use linestack_synth::{build_descriptor, has_errors, lint, synthesize, verify};

use super::load_inputs;
use crate::StackArgs;

pub fn synth(stack: &StackArgs, format: &str, out: Option<&str>) -> anyhow::Result<()> {
    let (ctx, repo) = load_inputs(stack)?;
    let descriptor = build_descriptor(&ctx, &repo);
    verify(&descriptor)?;

    let template = synthesize(&descriptor, &ctx);

    let rendered = match format {
        "text" => format_report(&descriptor, &lint(&descriptor)),
        "json" => template.to_json_pretty()?,
        other => bail!("unsupported format: {other} (expected json or text)"),
    };

    match out {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            eprintln!("✓ Wrote {path}");
        }
        None => println!("{rendered}"),
    }

    eprintln!("  SHA256: {}", template.fingerprint()?);
    Ok(())
}

pub fn validate(stack: &StackArgs) -> anyhow::Result<()> {
    let (ctx, repo) = load_inputs(stack)?;
    let descriptor = build_descriptor(&ctx, &repo);
    verify(&descriptor)?;

    let findings = lint(&descriptor);
    println!("{}", format_report(&descriptor, &findings));

    if has_errors(&findings) {
        bail!("descriptor would be rejected at apply time");
    }
    Ok(())
}
