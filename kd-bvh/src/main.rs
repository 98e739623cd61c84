use kd_bvh::{Geometry, KdTree, PackedNode};
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut geom = Geometry::new();
    geom.add_sphere(10.0, 32, 32);

    let packed = match KdTree::default().build(&geom.vertex_buffer(), &geom.indices) {
        Ok(packed) => packed,
        Err(e) => {
            error!("build failed: {e}");
            std::process::exit(1);
        }
    };

    let leaves = (0..packed.node_count())
        .filter_map(|visit| packed.node(visit))
        .filter(|node| matches!(node, PackedNode::Leaf { .. }))
        .count();

    info!(
        "sphere: {} triangles -> {} nodes ({} leaves), {} records, {} bytes",
        geom.triangle_count(),
        packed.node_count(),
        leaves,
        packed.len(),
        packed.as_bytes().len()
    );
}
