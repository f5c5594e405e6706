use glb_stage::bootstrap::StageOptions;

// Stages assets/models/model.glb with the default camera and helpers.
// RUST_LOG=info shows the load progress and any degraded-start errors.
fn main() -> anyhow::Result<()> {
    glb_stage::app::run(StageOptions::default())
}
