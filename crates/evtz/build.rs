use vergen_gitcl::{BuildBuilder, CargoBuilder, Emitter, GitclBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let cargo = CargoBuilder::default().target_triple(true).build()?;
    let gitcl = GitclBuilder::default().sha(true).build()?;

    let emitted = Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&cargo)?
        .add_instructions(&gitcl)?
        .emit();

    if emitted.is_err() {
        emit_fallback();
    }

    Ok(())
}

/// git が使えない環境（ソースアーカイブからのビルドなど）向けの値を出力する。
fn emit_fallback() {
    println!("cargo::rustc-env=VERGEN_BUILD_DATE=unknown");
    println!("cargo::rustc-env=VERGEN_CARGO_TARGET_TRIPLE=unknown");

    let sha = std::env::var("GITHUB_SHA")
        .map(|sha| sha.chars().take(7).collect::<String>())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo::rustc-env=VERGEN_GIT_SHA={sha}");
}
