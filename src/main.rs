use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use obj::{load_obj, Obj, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stackless_bvh::config::DEFAULT_SAH_THRESHOLD;
use stackless_bvh::{BuildConfig, BvhBuilder, FastTriangle};

/// Builds a stackless BVH over a scene the way the renderer does on every scene reload and
/// writes out the GPU buffers.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Wavefront OBJ files, each loaded as one scene object. A random scene is generated
    /// if none are given.
    objects: Vec<PathBuf>,

    /// Number of triangles of the random scene.
    #[arg(long, default_value_t = 100_000)]
    synthetic: usize,

    /// Seed of the random scene.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Ranges of up to this many triangles are split with the surface area heuristic.
    #[arg(long, default_value_t = DEFAULT_SAH_THRESHOLD)]
    sah_threshold: u32,

    /// Writes the packed node buffer to this file.
    #[arg(long)]
    output_nodes: Option<PathBuf>,

    /// Writes the second triangle halves to this file.
    #[arg(long)]
    output_triangles: Option<PathBuf>,

    /// Prints the node table.
    #[arg(long)]
    print: bool,
}

/// Appends the triangles of an indexed mesh. Vertex indices are offset by `first_vertex` so
/// that they stay unique across objects.
fn push_mesh(
    mesh: &Obj<Position, u32>,
    object_index: u32,
    first_vertex: u32,
    triangles: &mut Vec<FastTriangle>,
) {
    let position = |index: u32| Point3::from(mesh.vertices[index as usize].position);
    for face in mesh.indices.chunks_exact(3) {
        triangles.push(FastTriangle::new(
            position(face[0]),
            position(face[1]),
            position(face[2]),
            [
                first_vertex + face[0],
                first_vertex + face[1],
                first_vertex + face[2],
            ],
            object_index,
        ));
    }
}

/// Returns the vertex index offset of the object after one that starts at `first_vertex` and
/// has `vertex_count` vertices, or `None` if it leaves the 32-bit index space.
fn next_first_vertex(first_vertex: u32, vertex_count: usize) -> Option<u32> {
    u32::try_from(vertex_count)
        .ok()
        .and_then(|count| first_vertex.checked_add(count))
}

fn load_objects(paths: &[PathBuf]) -> anyhow::Result<Vec<FastTriangle>> {
    let mut triangles = Vec::new();
    let mut first_vertex = 0u32;
    for (object_index, path) in paths.iter().enumerate() {
        let object_index = u32::try_from(object_index).context("Too many objects")?;
        let mesh = load_mesh(path)?;
        if mesh.indices.len() % 3 != 0 {
            warn!(
                "{} has {} dangling indices, ignoring them.",
                path.display(),
                mesh.indices.len() % 3
            );
        }
        let next = next_first_vertex(first_vertex, mesh.vertices.len()).with_context(|| {
            format!(
                "{} pushes the scene past {} vertices",
                path.display(),
                u32::MAX
            )
        })?;
        push_mesh(&mesh, object_index, first_vertex, &mut triangles);
        info!(
            "Loaded {} ({} vertices, {} triangles).",
            path.display(),
            mesh.vertices.len(),
            mesh.indices.len() / 3
        );
        first_vertex = next;
    }
    Ok(triangles)
}

fn load_mesh(path: &Path) -> anyhow::Result<Obj<Position, u32>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    load_obj::<Position, _, u32>(BufReader::new(file))
        .with_context(|| format!("Failed to decode {}", path.display()))
}

/// Scatters `n` small triangles over a cube of 2000 units, each its own object.
fn random_scene(n: usize, seed: u64) -> Vec<FastTriangle> {
    let mut rng = StdRng::seed_from_u64(seed);
    let offset = |rng: &mut StdRng| -> Vector3<f32> {
        Vector3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        )
    };

    (0..n as u32)
        .map(|i| {
            let center = Point3::<f32>::new(
                rng.random_range(-1000.0..=1000.0),
                rng.random_range(-1000.0..=1000.0),
                rng.random_range(-1000.0..=1000.0),
            );
            FastTriangle::new(
                center + offset(&mut rng),
                center + offset(&mut rng),
                center + offset(&mut rng),
                [3 * i, 3 * i + 1, 3 * i + 2],
                i,
            )
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let triangles = if cli.objects.is_empty() {
        info!(
            "Generating {} random triangles with seed {}.",
            cli.synthetic, cli.seed
        );
        random_scene(cli.synthetic, cli.seed)
    } else {
        load_objects(&cli.objects)?
    };

    let mut builder = BvhBuilder::new(BuildConfig::new(cli.sah_threshold));
    let bvh = builder
        .build(&triangles)
        .context("Failed to build the BVH")?;
    if !bvh.is_consistent(triangles.as_slice()) {
        bail!("The BVH is inconsistent");
    }
    println!("{}", bvh.stats());

    if cli.print {
        bvh.pretty_print();
    }

    if let Some(path) = &cli.output_nodes {
        std::fs::write(path, bvh.packed_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Wrote {} node bytes to {}.",
            bvh.packed_bytes().len(),
            path.display()
        );
    }

    if let Some(path) = &cli.output_triangles {
        let (_, second) = FastTriangle::split_halves(&triangles);
        let bytes: &[u8] = bytemuck::cast_slice(&second);
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} triangle bytes to {}.", bytes.len(), path.display());
    }

    Ok(())
}
