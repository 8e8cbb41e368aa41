//! Subcommand bodies, kept apart from argument parsing so they can be
//! driven from tests.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use glam::DVec3;

use composer_engine::prelude::*;

/// Pick the archive layout from the path: `.tar` files are tar archives,
/// everything else is a directory tree.
pub fn transport_for(path: &Path) -> Box<dyn ArchiveTransport> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("tar")) {
        Box::new(TarTransport::new(path))
    } else {
        Box::new(DirectoryTransport::new(path))
    }
}

pub async fn load_config(path: &Path) -> anyhow::Result<ComposerConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: ComposerConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Six comma-separated numbers: the min corner, then the max corner.
pub fn parse_volume(values: &[f64]) -> anyhow::Result<SpawnVolume> {
    let [x0, y0, z0, x1, y1, z1] = values else {
        bail!("spawn volume needs exactly six values, got {}", values.len());
    };
    Ok(SpawnVolume::new(
        DVec3::new(*x0, *y0, *z0),
        DVec3::new(*x1, *y1, *z1),
    )?)
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

pub async fn inspect(bundle: &Path, config: ComposerConfig) -> anyhow::Result<String> {
    let transport = transport_for(bundle);
    let mut session = ComposerSession::new(config)?;
    let report = session
        .import_from(transport.as_ref())
        .await
        .with_context(|| format!("importing {}", bundle.display()))?;

    let scene = session.scene();
    let mut out = String::new();
    writeln!(out, "source:      {:?}", report.source)?;
    writeln!(out, "instruction: {}", scene.instruction())?;
    writeln!(out, "objects:     {}", scene.len())?;
    for object in scene.objects() {
        let p = object.transform.position;
        writeln!(
            out,
            "  {:<20} {:<20} {:<8} ({:.3}, {:.3}, {:.3})",
            object.id,
            object.name,
            if object.is_static() { "static" } else { "movable" },
            p.x,
            p.y,
            p.z
        )?;
    }
    writeln!(out, "conditions:  {}", session.history().len())?;
    for (index, snapshot) in session.history().iter().enumerate() {
        writeln!(out, "  #{index}: {} poses", snapshot.len())?;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// randomize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RandomizeSummary {
    pub objects: usize,
    pub conditions: usize,
    /// Accepted placements that ran out of attempts while still overlapping.
    pub unresolved: usize,
}

/// Import `input`, accept `episodes` freshly drawn placements, and export the
/// scene with its new history to `output`.
pub async fn randomize(
    input: &Path,
    output: &Path,
    episodes: usize,
    volume: Option<SpawnVolume>,
    config: ComposerConfig,
) -> anyhow::Result<RandomizeSummary> {
    let mut session = ComposerSession::new(config)?;
    session
        .import_from(transport_for(input).as_ref())
        .await
        .with_context(|| format!("importing {}", input.display()))?;
    if let Some(volume) = volume {
        session.set_spawn_volume(volume);
    }
    session.clear_history();

    let mut unresolved = 0;
    let mut placed = session.draw_new_placement();
    for _ in 0..episodes {
        unresolved += placed.iter().filter(|p| !p.collision_free).count();
        let (index, next) = session.accept_and_redraw();
        tracing::debug!(index, "condition accepted");
        placed = next;
    }
    if unresolved > 0 {
        tracing::warn!(unresolved, "some accepted placements still overlap");
    }

    session
        .export_to(transport_for(output).as_ref())
        .await
        .with_context(|| format!("exporting {}", output.display()))?;

    Ok(RandomizeSummary {
        objects: session.scene().len(),
        conditions: session.history().len(),
        unresolved,
    })
}

// ---------------------------------------------------------------------------
// repack
// ---------------------------------------------------------------------------

/// Copy every stream of a bundle to another layout. Returns the file count.
pub async fn repack(input: &Path, output: &Path) -> anyhow::Result<usize> {
    let source = transport_for(input);
    let target = transport_for(output);
    let files = source
        .unpack()
        .await
        .with_context(|| format!("reading {}", input.display()))?;
    target
        .pack(&files)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(from = source.name(), to = target.name(), files = files.len(), "bundle repacked");
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESH: &[u8] = b"v -0.05 0 -0.05\nv 0.05 0 -0.05\nv 0 0.1 0.05\nf 1 2 3\n";

    fn object(id: &str, name: &str) -> SceneObject {
        SceneObject::new(
            id,
            name,
            AssetRef::new(name, "mesh.obj").with_file("mesh.obj", MESH.to_vec()),
        )
    }

    async fn write_sample(path: &Path) {
        let mut config = ComposerConfig::default();
        config.placement.seed = Some(3);
        let mut session = ComposerSession::new(config).unwrap();
        let mut table = object("table", "Table");
        table.disable_gravity = true;
        session.add_object(table).unwrap();
        session.add_object(object("cup", "Cup")).unwrap();
        session.set_instruction("move the cup");
        session.export_to(transport_for(path).as_ref()).await.unwrap();
    }

    #[test]
    fn tar_extension_selects_tar_transport() {
        assert_eq!(transport_for(Path::new("out/scene.tar")).name(), "tar");
        assert_eq!(transport_for(Path::new("out/scene.TAR")).name(), "tar");
        assert_eq!(transport_for(Path::new("out/scene")).name(), "directory");
    }

    #[test]
    fn volume_needs_six_ordered_values() {
        let volume = parse_volume(&[-1.0, -1.0, 0.0, 1.0, 1.0, 0.5]).unwrap();
        assert_eq!(volume.max(), DVec3::new(1.0, 1.0, 0.5));
        assert!(parse_volume(&[0.0; 5]).is_err());
        assert!(parse_volume(&[1.0, 0.0, 0.0, 0.0, 1.0, 1.0]).is_err());
    }

    #[tokio::test]
    async fn config_file_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.toml");
        tokio::fs::write(&good, "[placement]\nmax_attempts = 12\nseed = 5\n")
            .await
            .unwrap();
        let config = load_config(&good).await.unwrap();
        assert_eq!(config.placement.max_attempts, 12);
        assert_eq!(config.placement.seed, Some(5));
        assert!(!config.export.pretty_json);

        let bad = dir.path().join("bad.toml");
        tokio::fs::write(&bad, "[placement]\nmax_attempts = 0\n")
            .await
            .unwrap();
        assert!(load_config(&bad).await.is_err());
    }

    #[tokio::test]
    async fn randomize_writes_the_requested_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene");
        let output = dir.path().join("scene-4.tar");
        write_sample(&input).await;

        let mut config = ComposerConfig::default();
        config.placement.seed = Some(11);
        let summary = randomize(&input, &output, 4, None, config).await.unwrap();
        assert_eq!(summary.objects, 2);
        assert_eq!(summary.conditions, 4);

        let report = inspect(&output, ComposerConfig::default()).await.unwrap();
        assert!(report.contains("instruction: move the cup"));
        assert!(report.contains("conditions:  4"));
    }

    #[tokio::test]
    async fn repack_preserves_every_stream() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene");
        let packed = dir.path().join("scene.tar");
        write_sample(&input).await;

        let count = repack(&input, &packed).await.unwrap();
        let from_dir = transport_for(&input).unpack().await.unwrap();
        let from_tar = transport_for(&packed).unpack().await.unwrap();
        assert_eq!(count, from_dir.len());
        assert_eq!(from_dir.digest(), from_tar.digest());
    }
}
