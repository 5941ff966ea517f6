use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use panel_layers::{CharacterPalette, ColorStyle, LayerStack, PostProcessSettings};

/// Everything the colorizer gets from the editor page.
#[derive(Debug, Clone)]
pub struct ColorizeRequest {
    pub original: Bytes,
    /// An already colored panel of the same character, if the user uploaded one.
    pub reference: Option<Bytes>,
    pub character_name: String,
    pub palette: CharacterPalette,
    pub style: ColorStyle,
    pub post_process: PostProcessSettings,
}

#[derive(Debug, Clone)]
pub struct Colorized {
    pub image: Bytes,
    /// Starting layers for the editor.
    pub layers: LayerStack,
}

#[async_trait]
pub trait Colorizer {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn colorize(&self, request: ColorizeRequest) -> Result<Colorized, Self::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum ColorizeError {
    #[error("No panel image to colorize")]
    EmptyImage,
}

/// Waits a fixed time, then hands the original back as the "colorized"
/// panel together with placeholder Hair and Eyes layers.
pub struct MockColorizer {
    delay: Duration,
}

impl MockColorizer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Colorizer for MockColorizer {
    type Error = ColorizeError;

    #[tracing::instrument(
        skip(self, request),
        fields(style = request.style.id(), reference = request.reference.is_some())
    )]
    async fn colorize(&self, request: ColorizeRequest) -> Result<Colorized, Self::Error> {
        if request.original.is_empty() {
            return Err(ColorizeError::EmptyImage);
        }
        tokio::time::sleep(self.delay).await;
        tracing::info!("Colorized panel ({} bytes)", request.original.len());
        Ok(Colorized {
            image: request.original,
            layers: LayerStack::seeded(&request.palette),
        })
    }
}

#[cfg(test)]
mod tests {
    use panel_layers::{HexColor, LayerId};

    use super::*;

    fn request(original: &'static [u8]) -> ColorizeRequest {
        ColorizeRequest {
            original: Bytes::from_static(original),
            reference: None,
            character_name: "Marin Kitagawa".to_string(),
            palette: CharacterPalette {
                hair: "#FFD700".parse().unwrap(),
                eyes: "#FF0000".parse().unwrap(),
                clothes: "#000000".parse().unwrap(),
            },
            style: ColorStyle::AnimeStyle,
            post_process: PostProcessSettings::default(),
        }
    }

    #[tokio::test]
    async fn mock_seeds_layers_from_the_palette() {
        let colorizer = MockColorizer::new(Duration::ZERO);
        let colorized = colorizer.colorize(request(b"png")).await.unwrap();
        assert_eq!(colorized.image, Bytes::from_static(b"png"));
        assert_eq!(colorized.layers.len(), 2);

        let eyes = colorized.layers.get(&LayerId::new("eyes-layer")).unwrap();
        assert_eq!(eyes.color, Some("#FF0000".parse::<HexColor>().unwrap()));
        assert_eq!(eyes.opacity, 0.8);
    }

    #[tokio::test]
    async fn empty_image_is_rejected() {
        let colorizer = MockColorizer::new(Duration::ZERO);
        assert!(matches!(
            colorizer.colorize(request(b"")).await,
            Err(ColorizeError::EmptyImage)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn mock_takes_its_time() {
        let colorizer = MockColorizer::new(Duration::from_secs(2));
        let started = tokio::time::Instant::now();
        colorizer.colorize(request(b"png")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
