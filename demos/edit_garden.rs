//! Garden editing example - applies a preset prompt to a photo.
//!
//! Run with: `cargo run --example edit_garden -- <backyard.jpg>`
//!
//! Requires the `API_KEY` (or `GOOGLE_API_KEY`) environment variable.

use garden_designer::{FileSource, GeminiEditor, SessionController, SessionPhase};

#[tokio::main]
async fn main() -> garden_designer::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: edit_garden <backyard.jpg>");

    let mut session = SessionController::new(GeminiEditor::builder().build()?);
    if session.upload(&FileSource::new(&input_path)).await != SessionPhase::ImageLoaded {
        eprintln!("{}", session.state().error.unwrap_or_default());
        return Ok(());
    }
    session.use_preset(1)?;

    match session.submit().await {
        SessionPhase::Succeeded => {
            let path = session.save_result(".").await?;
            println!("Edited garden saved to {}", path.display());
        }
        _ => eprintln!("{}", session.state().error.unwrap_or_default()),
    }

    Ok(())
}
