//! `hostbind check` - validate declarations without writing.

use std::path::PathBuf;

use anyhow::Context;
use hostbind_gen::registry::MemberKind;

pub fn execute(sources: &[PathBuf], json: bool) -> anyhow::Result<()> {
    let generation = super::generator(sources)?
        .generate()
        .context("check failed")?;
    let manifest = &generation.manifest;

    if json {
        println!("{}", manifest.to_json().context("failed to serialize manifest")?);
        return Ok(());
    }

    for ty in &manifest.types {
        let mut flags = Vec::new();
        if ty.is_static {
            flags.push("static");
        }
        if ty.is_abstract {
            flags.push("abstract");
        }
        if !ty.inherit_base_members {
            flags.push("no-inherit");
        }

        print!("{} ({})", ty.name, ty.rust_path);
        if let Some(base) = &ty.base {
            print!(" : {}", base);
        }
        if !flags.is_empty() {
            print!(" [{}]", flags.join(", "));
        }
        println!();

        for member in &ty.members {
            let kind = match member.kind {
                MemberKind::Field => "field",
                MemberKind::Property => "property",
                MemberKind::Method => "method",
            };
            println!("  {:<8} {}", kind, member.name);
        }
        println!("  {} constructor(s)", ty.constructors.len());
    }

    match &manifest.anchor {
        Some(anchor) => println!("Registry anchor: {}", anchor),
        None => println!("Registry anchor: none"),
    }
    println!("OK: {} type(s)", manifest.types.len());
    Ok(())
}
