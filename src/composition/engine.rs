use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    composition::strip::{compose, ComposedStrip, OffsetEntry, StripParams},
    config::Config,
    error::{Result, StitchError},
    frames::{crop_all, Frame, FrameLoader},
    output::{replace_file, EncoderRegistry, EncoderSettings, ImageEncoder, Sidecar},
};

/// Main engine that turns a directory of renders into a strip and sidecar
///
/// The engine follows a clear pipeline:
/// 1. Frame Loading - Discover, order and decode the rendered frames
/// 2. Cropping - Reduce each frame to its opaque bounding box
/// 3. Composition - Normalize against the shared bounds and paste into one strip
/// 4. Output Generation - Write the composite image and the offset sidecar
///
/// Nothing is written unless steps 1-3 succeed.
pub struct StitchEngine {
    config: Config,
    encoders: EncoderRegistry,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct StitchReport {
    pub image_path: PathBuf,
    pub sidecar_path: PathBuf,
    pub frame_count: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub params: StripParams,
    pub offsets: Vec<OffsetEntry>,
}

impl StitchEngine {
    /// Create a new engine with the built-in encoders
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, EncoderRegistry::new())
    }

    /// Create an engine with a custom encoder registry
    pub fn with_registry(config: Config, encoders: EncoderRegistry) -> Self {
        Self { config, encoders }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline, stamping the sidecar with the current time
    ///
    /// # Arguments
    ///
    /// * `input_dir` - Directory of rendered frames (`render00.png`, `render01.png`, ...)
    /// * `output_dir` - Directory that receives the image and the sidecar
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input_dir: P, output_dir: Q) -> Result<StitchReport> {
        self.run_with_timestamp(input_dir, output_dir, Utc::now())
    }

    /// Run the whole pipeline with an explicit cache-busting timestamp
    pub fn run_with_timestamp<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Q,
        generated_at: DateTime<Utc>,
    ) -> Result<StitchReport> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();

        info!("🎬 Starting turntable stitch");
        info!("   Frames: {:?}", input_dir);
        info!("   Output: {:?}", output_dir);
        info!("   Format: {}", self.config.output.format);

        self.config.validate()?;
        let encoder = self.encoders.resolve(&self.config.output.format)?;

        // Pipeline Steps 1 & 2: Loading and Cropping
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.layout.decode_threads)
            .build()
            .map_err(|e| StitchError::generic(format!("Failed to start worker pool: {}", e)))?;
        let frames = pool.install(|| FrameLoader::load_directory(input_dir))?;
        let frame_count = frames.len();

        // Pipeline Step 3: Composition
        let (strip, params) = pool.install(|| self.stitch_frames(frames))?;

        // Pipeline Step 4: Output Generation
        let (image_path, sidecar_path) =
            self.write_outputs(&strip, &params, encoder.as_ref(), output_dir, generated_at)?;

        info!("🎉 Stitch complete! {}x{} strip from {} frames", strip.canvas_width(), strip.canvas_height(), frame_count);

        Ok(StitchReport {
            image_path,
            sidecar_path,
            frame_count,
            canvas_width: strip.canvas_width(),
            canvas_height: strip.canvas_height(),
            params,
            offsets: strip.offsets,
        })
    }

    /// Crop and compose already-decoded frames, in presentation order
    pub fn stitch_frames(&self, frames: Vec<Frame>) -> Result<(ComposedStrip, StripParams)> {
        let layout = &self.config.layout;
        let params = StripParams {
            y_rotations: layout.y_rotations_for(frames.len()),
            x_rotations_total: layout.x_rotations_total(),
            target_dimension: layout.target_dimension,
        };
        debug!("Strip parameters: {:?}", params);

        let cropped = crop_all(frames)?;
        let strip = compose(&cropped, &params)?;
        Ok((strip, params))
    }

    fn encoder_settings(&self) -> EncoderSettings {
        let output = &self.config.output;
        EncoderSettings {
            jpeg_quality: output.jpeg_quality,
            png_compression: output.png_compression,
            write_buffer_bytes: output.write_buffer_bytes,
        }
    }

    fn write_image(&self, strip: &ComposedStrip, encoder: &dyn ImageEncoder, output_dir: &Path) -> Result<PathBuf> {
        let file_name = format!("{}.{}", self.config.output.image_stem, encoder.extension());
        let path = output_dir.join(file_name);
        let settings = self.encoder_settings();
        let capacity = settings.buffer_capacity(strip.canvas_width(), strip.canvas_height());

        replace_file(&path, capacity, |writer| encoder.encode(&strip.canvas, writer, &settings))?;

        info!("   Wrote {} image {:?}", encoder.name(), path);
        Ok(path)
    }

    /// Write the image then the sidecar. The sidecar text is rendered first so
    /// a template problem never leaves a fresh image without its offsets.
    fn write_outputs(
        &self,
        strip: &ComposedStrip,
        params: &StripParams,
        encoder: &dyn ImageEncoder,
        output_dir: &Path,
        generated_at: DateTime<Utc>,
    ) -> Result<(PathBuf, PathBuf)> {
        let sidecar_text = self.render_sidecar(strip, params, generated_at)?;

        std::fs::create_dir_all(output_dir)?;
        let image_path = self.write_image(strip, encoder, output_dir)?;
        let sidecar_path = self.write_sidecar(&sidecar_text, output_dir)?;
        Ok((image_path, sidecar_path))
    }

    fn render_sidecar(&self, strip: &ComposedStrip, params: &StripParams, generated_at: DateTime<Utc>) -> Result<String> {
        let sidecar_config = &self.config.sidecar;
        let sidecar = Sidecar::from_strip(
            strip,
            params.x_rotations_total,
            params.target_dimension,
            &sidecar_config.url,
            sidecar_config.start_frame,
            generated_at,
        );
        sidecar.render(&sidecar_config.template)
    }

    fn write_sidecar(&self, text: &str, output_dir: &Path) -> Result<PathBuf> {
        let path = output_dir.join(&self.config.output.sidecar_name);
        replace_file(&path, 8 * 1024, |writer| {
            writer.write_all(text.as_bytes())?;
            Ok(())
        })?;

        info!("   Wrote sidecar {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;
    use crate::frames::CropRect;
    use chrono::TimeZone;
    use tempfile::tempdir;

    const SCENARIO: [CropRect; 3] = [
        CropRect { left: 10, top: 20, right: 90, bottom: 95 },
        CropRect { left: 5, top: 5, right: 95, bottom: 95 },
        CropRect { left: 30, top: 30, right: 70, bottom: 70 },
    ];

    fn write_frames(dir: &Path, rects: &[CropRect]) {
        for (i, &rect) in rects.iter().enumerate() {
            let mut frame = Frame::new_transparent(100, 100);
            frame.fill_rect(rect, [60, 120, 200, 255]);
            frame.as_image().save(dir.join(format!("render{}{}.png", i, 0))).unwrap();
        }
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.layout.decode_threads = 2;
        config
    }

    #[test]
    fn test_end_to_end_png() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_frames(input.path(), &SCENARIO);

        let engine = StitchEngine::new(test_config());
        let report = engine.run_with_timestamp(input.path(), output.path(), fixed_time()).unwrap();

        assert_eq!(report.frame_count, 3);
        assert_eq!(report.params.y_rotations, 1);
        assert_eq!(report.params.x_rotations_total, 3);
        assert!(report.image_path.ends_with("weapon.png"));

        let image = image::open(&report.image_path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (report.canvas_width, report.canvas_height));

        let sidecar = std::fs::read_to_string(&report.sidecar_path).unwrap();
        assert!(sidecar.contains("<nowiki>url?20240506070809</nowiki>"));
        assert!(sidecar.contains(&format!(
            "{}, {}, {}, 3, 0, ",
            report.canvas_width, report.canvas_height, report.canvas_height
        )));
        assert!(sidecar.contains("| height = 280"));
        assert!(sidecar.contains("| startframe = 16"));
    }

    #[test]
    fn test_runs_are_reproducible() {
        let input = tempdir().unwrap();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_frames(input.path(), &SCENARIO);

        let engine = StitchEngine::new(test_config());
        let a = engine.run_with_timestamp(input.path(), first.path(), fixed_time()).unwrap();
        let b = engine.run_with_timestamp(input.path(), second.path(), fixed_time()).unwrap();

        assert_eq!(a.offsets, b.offsets);
        assert_eq!(std::fs::read(&a.image_path).unwrap(), std::fs::read(&b.image_path).unwrap());
        assert_eq!(
            std::fs::read_to_string(&a.sidecar_path).unwrap(),
            std::fs::read_to_string(&b.sidecar_path).unwrap()
        );
    }

    #[test]
    fn test_jpeg_output_replaces_previous_run() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_frames(input.path(), &SCENARIO);
        std::fs::write(output.path().join("weapon.jpeg"), "stale").unwrap();

        let mut config = test_config();
        config.output.format = "JPEG".to_string();
        let report = StitchEngine::new(config).run(input.path(), output.path()).unwrap();

        assert!(report.image_path.ends_with("weapon.jpeg"));
        let image = image::open(&report.image_path).unwrap();
        assert_eq!(image.width(), report.canvas_width);
    }

    #[test]
    fn test_transparent_frame_writes_nothing() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_frames(input.path(), &SCENARIO[..2]);
        Frame::new_transparent(100, 100)
            .as_image()
            .save(input.path().join("render20.png"))
            .unwrap();

        let err = StitchEngine::new(test_config())
            .run(input.path(), output.path())
            .unwrap_err();

        assert!(matches!(err, StitchError::Frame(FrameError::EmptyFrame { .. })));
        assert!(!output.path().join("weapon.png").exists());
        assert!(!output.path().join("weaponoffsets.txt").exists());
    }

    #[test]
    fn test_sidecar_rendered_before_image_is_written() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        write_frames(input.path(), &SCENARIO);
        let frames = FrameLoader::load_directory(input.path()).unwrap();

        let mut config = test_config();
        config.sidecar.template = "${frame_count}".to_string();
        let engine = StitchEngine::new(config);
        let (strip, params) = engine.stitch_frames(frames).unwrap();
        let encoder = engine.encoders.resolve("png").unwrap();

        let err = engine
            .write_outputs(&strip, &params, encoder.as_ref(), output.path(), fixed_time())
            .unwrap_err();

        assert!(matches!(err, StitchError::Config(_)));
        assert!(!output.path().join("weapon.png").exists());
        assert!(!output.path().join("weaponoffsets.txt").exists());
    }

    #[test]
    fn test_unknown_format_fails_before_loading() {
        let output = tempdir().unwrap();
        let mut config = test_config();
        config.output.format = "tiff".to_string();

        let err = StitchEngine::new(config)
            .run(output.path().join("missing"), output.path())
            .unwrap_err();
        assert!(err.to_string().contains("tiff"));
    }

    #[test]
    fn test_stitch_frames_in_memory() {
        let frames = SCENARIO
            .iter()
            .map(|&rect| {
                let mut frame = Frame::new_transparent(100, 100);
                frame.fill_rect(rect, [1, 1, 1, 255]);
                frame
            })
            .collect();

        let mut config = test_config();
        config.layout.y_rotations = Some(1);
        config.layout.x_rotations = 0;

        let (strip, params) = StitchEngine::new(config).stitch_frames(frames).unwrap();
        assert_eq!((params.y_rotations, params.x_rotations_total), (1, 1));
        assert_eq!(strip.offsets.len(), 3);
        assert_eq!(strip.offsets[0].left_crop, 15);
    }
}
