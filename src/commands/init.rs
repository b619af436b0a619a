use crate::{
    InitArgs,
    config::{CONFIG_FILE_NAME, SiteConfig},
    theme,
};

const SAMPLE_DOCUMENT_NAME: &str = "hello-world.md";

const SAMPLE_DOCUMENT: &str = "---
title: Hello, world
date: 2018-01-01
description: The first post on this site
---

This is the first post. Link to other posts by slug, like
[il:hello-world][this very page], and add notes.[^1]

```python
print(\"hello, world\")
```

[^1]: Footnotes link back to where they were referenced.
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_path = path.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_path.display()
        ));
    }

    println!("Initializing project in {}", path.display());

    let default_config = SiteConfig::default();
    let config_text = serde_yaml::to_string(&default_config)?;
    tokio::fs::write(&config_path, config_text).await?;
    println!(
        "Created config file {config_file}",
        config_file = config_path.display()
    );

    let source_dir = path.join(&default_config.paths.source);
    let sample = source_dir.join(SAMPLE_DOCUMENT_NAME);
    if !sample.exists() {
        tokio::fs::create_dir_all(&source_dir).await?;
        tokio::fs::write(&sample, SAMPLE_DOCUMENT).await?;
        println!("Created sample document {}", sample.display());
    }

    let theme_dir = path.join(&default_config.theme.path);
    let created = tokio::task::spawn_blocking(move || theme::scaffold(&theme_dir)).await??;
    for file in created {
        tracing::debug!(file = %file.display(), "created theme file");
    }
    println!("Created theme in {}", path.join(&default_config.theme.path).display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::build::{BuildMode, Builder};
    use crate::config::LoadedConfig;

    #[tokio::test]
    async fn test_init_scaffolds_a_buildable_site() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blog");

        run(&InitArgs {
            path: root.clone(),
            create: true,
        })
        .await
        .unwrap();

        assert!(root.join("harmonique.yaml").exists());
        assert!(root.join("source/hello-world.md").exists());
        assert!(root.join("theme/templates/detail.html").exists());
        assert!(root.join("theme/css/site.css").exists());

        // The generated config loads back and the sample builds
        let config = SiteConfig::load_from_file(&root.join("harmonique.yaml")).unwrap();
        let loaded = LoadedConfig {
            config,
            base_path: root.clone(),
            config_path: root.join("harmonique.yaml"),
        };
        let result = Builder::new(loaded, BuildMode::Prod).build().unwrap();
        assert_eq!(result.published, 1);
        assert!(root.join("output/hello-world/index.html").exists());
    }

    #[tokio::test]
    async fn test_init_requires_existing_dir_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&InitArgs {
            path: dir.path().join("missing"),
            create: false,
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("harmonique.yaml"), "site: {}\n").unwrap();
        let result = run(&InitArgs {
            path: PathBuf::from(dir.path()),
            create: false,
        })
        .await;
        assert!(result.is_err());
    }
}
