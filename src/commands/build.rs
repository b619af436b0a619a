use crate::{
    ModeArgs,
    build::{BuildMode, Builder},
    config::SiteConfig,
};

pub async fn run(args: &ModeArgs, mode: BuildMode) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;

    // Rendering is CPU-bound and parallelized with rayon
    let builder = Builder::new(config, mode);
    let result = tokio::task::spawn_blocking(move || builder.build()).await??;

    println!(
        "Built site to {} ({} published, {} drafts excluded, {} static files)",
        result.output_dir.display(),
        result.published,
        result.excluded,
        result.static_files
    );

    Ok(())
}
