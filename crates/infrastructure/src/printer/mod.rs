pub mod mock_renderer;
pub mod process_renderer;

pub use mock_renderer::{MockRenderer, RendererCall};
pub use process_renderer::ProcessRenderer;
