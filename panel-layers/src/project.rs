use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::Path,
};

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::{CharacterPalette, ColorStyle, ColoringMode, LayerStack, PostProcessSettings};

pub const FORMAT_VERSION: u32 = 1;

const MANIFEST: &str = "manifest.json";
const LAYERS: &str = "layers.json";

mod json_model {
    use serde::{Deserialize, Serialize};

    use crate::PanelMetadata;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Manifest {
        pub version: u32,
        pub metadata: PanelMetadata,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub original: Option<ImageEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub colorized: Option<ImageEntry>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ImageEntry {
        pub file: String,
        pub width: u32,
        pub height: u32,
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Invalid panel project: no manifest.json found")]
    NoManifest,
    #[error("Unsupported panel project version {0}")]
    UnsupportedVersion(u32),
    #[error("Missing image {0} in panel project")]
    MissingImage(String, #[source] zip::result::ZipError),
    #[error("Failed to parse json {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Failed to read image")]
    ImageParsing(#[from] image::ImageError),
    #[error("Zip error")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error")]
    IOError(#[from] std::io::Error),
}

/// What the user told the editor about the panel.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelMetadata {
    pub title: String,
    pub manga_title: String,
    pub character_name: String,
    pub context: String,
    pub mode: ColoringMode,
    pub style: ColorStyle,
    pub palette: CharacterPalette,
    pub post_process: PostProcessSettings,
}

/// An encoded image kept verbatim, with the size read from its header.
#[derive(Clone, PartialEq)]
pub struct PanelImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PanelImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl PanelImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ProjectError> {
        let format = image::guess_format(&bytes)?;
        let image = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            format,
            width: image.width(),
            height: image.height(),
            bytes,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }
}

/// Everything needed to reopen an editing session.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct PanelProject {
    pub metadata: PanelMetadata,
    pub stack: LayerStack,
    pub original: Option<PanelImage>,
    pub colorized: Option<PanelImage>,
}

impl PanelProject {
    pub fn new(metadata: PanelMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, ProjectError> {
        let mut zip = ZipArchive::new(reader)?;

        let manifest: json_model::Manifest = {
            let mut entry = zip.by_name(MANIFEST).map_err(|_err| ProjectError::NoManifest)?;
            serde_json::from_reader(&mut entry)?
        };
        if manifest.version != FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion(manifest.version));
        }

        let stack = match zip.by_name(LAYERS) {
            Ok(mut entry) => serde_json::from_reader(&mut entry)?,
            Err(_) => {
                log::warn!("Panel project has no {LAYERS}, starting with an empty stack");
                LayerStack::new()
            }
        };

        let original = manifest
            .original
            .map(|entry| read_image(&mut zip, &entry))
            .transpose()?;
        let colorized = manifest
            .colorized
            .map(|entry| read_image(&mut zip, &entry))
            .transpose()?;

        Ok(Self {
            metadata: manifest.metadata,
            stack,
            original,
            colorized,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, ProjectError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default();

        let original = self.original.as_ref().map(|img| image_entry("original", img));
        let colorized = self.colorized.as_ref().map(|img| image_entry("colorized", img));

        for (entry, image) in [(&original, &self.original), (&colorized, &self.colorized)] {
            if let (Some(entry), Some(image)) = (entry, image) {
                zip.start_file(entry.file.as_str(), options)?;
                zip.write_all(&image.bytes)?;
            }
        }

        zip.start_file(LAYERS, options)?;
        serde_json::to_writer_pretty(&mut zip, &self.stack)?;

        let manifest = json_model::Manifest {
            version: FORMAT_VERSION,
            metadata: self.metadata.clone(),
            original,
            colorized,
        };
        zip.start_file(MANIFEST, options)?;
        serde_json::to_writer_pretty(&mut zip, &manifest)?;

        Ok(zip.finish()?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let mut writer = self.write_to(BufWriter::new(File::create(path)?))?;
        writer.flush()?;
        Ok(())
    }
}

fn image_entry(name: &str, image: &PanelImage) -> json_model::ImageEntry {
    json_model::ImageEntry {
        file: format!("images/{name}.{}", image.extension()),
        width: image.width,
        height: image.height,
    }
}

fn read_image<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    entry: &json_model::ImageEntry,
) -> Result<PanelImage, ProjectError> {
    let mut file = zip
        .by_name(&entry.file)
        .map_err(|err| ProjectError::MissingImage(entry.file.clone(), err))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let format = image::guess_format(&bytes)?;
    // the header was checked when the project was saved
    Ok(PanelImage {
        format,
        width: entry.width,
        height: entry.height,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{Geometry, LayerId, LayerKind, LayerSpec};

    pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn sample_project() -> PanelProject {
        let metadata = PanelMetadata {
            title: "Gojo vs. Sukuna".to_string(),
            manga_title: "Jujutsu Kaisen".to_string(),
            character_name: "Gojo Satoru".to_string(),
            style: ColorStyle::CelShading,
            ..Default::default()
        };
        let mut stack = LayerStack::seeded(&metadata.palette);
        stack.add_layer(LayerSpec::new(
            LayerKind::Background,
            Geometry::new(0.0, 0.0, 320.0, 240.0),
        ));
        let original = PanelImage::from_bytes(tiny_png(32, 24)).unwrap();
        PanelProject {
            metadata,
            stack,
            colorized: Some(original.clone()),
            original: Some(original),
        }
    }

    #[test]
    fn panel_image_reads_its_size() {
        let image = PanelImage::from_bytes(tiny_png(7, 3)).unwrap();
        assert_eq!((image.width, image.height), (7, 3));
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.extension(), "png");

        assert!(PanelImage::from_bytes(b"not an image".to_vec()).is_err());
    }

    #[test]
    fn save_and_reopen_a_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.zip");
        let project = sample_project();
        project.save(&path).unwrap();

        let reopened = PanelProject::open(&path).unwrap();
        assert_eq!(reopened, project);
        assert!(reopened.stack.get(&LayerId::new("hair-layer")).is_some());
    }

    #[test]
    fn project_without_layers_has_an_empty_stack() {
        let mut project = sample_project();
        project.stack = LayerStack::new();
        project.original = None;
        project.colorized = None;
        let bytes = project.write_to(Cursor::new(Vec::new())).unwrap().into_inner();

        let reopened = PanelProject::from_reader(Cursor::new(bytes)).unwrap();
        assert!(reopened.stack.is_empty());
        assert_eq!(reopened.metadata.style, ColorStyle::CelShading);
    }

    #[test]
    fn archive_without_manifest_is_rejected() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("layers.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"[]").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            PanelProject::from_reader(Cursor::new(bytes)),
            Err(ProjectError::NoManifest)
        ));
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("manifest.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(br#"{"version": 9, "metadata": {}}"#).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            PanelProject::from_reader(Cursor::new(bytes)),
            Err(ProjectError::UnsupportedVersion(9))
        ));
    }

    fn archive_with_layers(layers: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("manifest.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(br#"{"version": 1, "metadata": {}}"#).unwrap();
        zip.start_file("layers.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(layers.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    const LAYER: &str = r#"{"id":"a","name":"A","kind":"custom","visible":true,"x":0,"y":0,"width":10,"height":10,"opacity":1}"#;

    #[test]
    fn duplicate_layer_ids_fail_to_load() {
        let bytes = archive_with_layers(&format!("[{LAYER},{LAYER}]"));
        assert!(PanelProject::from_reader(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn loaded_layers_are_clamped_or_rejected() {
        let loud = LAYER.replace(r#""opacity":1"#, r#""opacity":7.5"#);
        let bytes = archive_with_layers(&format!("[{loud}]"));
        let project = PanelProject::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(project.stack.iter().next().unwrap().opacity, 1.0);

        let tiny = LAYER.replace(r#""width":10,"height":10"#, r#""width":1,"height":1"#);
        let bytes = archive_with_layers(&format!("[{tiny}]"));
        assert!(matches!(
            PanelProject::from_reader(Cursor::new(bytes)),
            Err(ProjectError::JsonParsing(_))
        ));
    }
}
