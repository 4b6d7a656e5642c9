use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use aic_render::{
    AicError, ColorMode, ConversionOptions, Converter, FontFace, FrameOutput, GlyphGrid,
    GlyphGridSeries, GlyphStrategy, Ramp, RasterStyle, Sizing, SourceFrame, DEFAULT_FONT_PX,
};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert images and GIFs into ASCII art")]
struct Cli {
    /// Image paths, directories, URLs, or `-` for piped input
    #[arg(required = true)]
    inputs: Vec<String>,
    #[command(flatten)]
    settings: RenderSettings,
    #[command(flatten)]
    save: SaveSettings,
}

#[derive(Parser, Debug, Clone)]
struct RenderSettings {
    /// Exact output size in characters
    #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"],
        conflicts_with_all = ["width", "height", "full"])]
    dimensions: Option<Vec<u32>>,
    /// Output width in characters; height follows the image aspect ratio
    #[arg(short = 'W', long, conflicts_with_all = ["height", "full"])]
    width: Option<u32>,
    /// Output height in characters; width follows the image aspect ratio
    #[arg(short = 'H', long, conflicts_with = "full")]
    height: Option<u32>,
    /// Fit the output to the terminal
    #[arg(short, long, default_value_t = false)]
    full: bool,
    /// Use the longer 70 character ramp
    #[arg(short, long, default_value_t = false, conflicts_with = "map")]
    complex: bool,
    /// Custom character ramp, darkest-appearing character first
    #[arg(short, long)]
    map: Option<String>,
    /// Use braille patterns instead of a character ramp
    #[arg(short, long, default_value_t = false, conflicts_with_all = ["complex", "map"])]
    braille: bool,
    /// Brightness (0-255) at which a braille dot is lit
    #[arg(long, default_value_t = GlyphStrategy::DEFAULT_THRESHOLD as i64, requires = "braille")]
    threshold: i64,
    /// Error-diffusion dithering before picking characters
    #[arg(long, default_value_t = false)]
    dither: bool,
    /// Color characters with the source colors
    #[arg(short = 'C', long, default_value_t = false)]
    color: bool,
    /// Apply colors to the character background instead
    #[arg(long = "color-bg", default_value_t = false, requires = "color")]
    color_bg: bool,
    /// Grayscale colors
    #[arg(short, long, default_value_t = false)]
    grayscale: bool,
    /// Invert brightness and colors
    #[arg(short, long, default_value_t = false)]
    negative: bool,
    /// Mirror horizontally
    #[arg(short = 'x', long = "flipX", default_value_t = false)]
    flip_x: bool,
    /// Mirror vertically
    #[arg(short = 'y', long = "flipY", default_value_t = false)]
    flip_y: bool,
}

#[derive(Parser, Debug, Clone)]
struct SaveSettings {
    /// Directory to save the ascii art as a text file
    #[arg(short = 's', long = "save-txt", value_name = "DIR")]
    save_txt: Option<PathBuf>,
    /// Directory to save the ascii art rendered as a png
    #[arg(long = "save-img", value_name = "DIR")]
    save_img: Option<PathBuf>,
    /// Directory to save a gif input rendered as an ascii art gif
    #[arg(long = "save-gif", value_name = "DIR")]
    save_gif: Option<PathBuf>,
    /// Font file used for rendered images and gifs; a bundled monospace face otherwise
    #[arg(long)]
    font: Option<PathBuf>,
    /// Font size in pixels for rendered output
    #[arg(long, default_value_t = DEFAULT_FONT_PX)]
    font_size: f32,
    /// Default character color for rendered output
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = [255u8, 255, 255])]
    font_color: Vec<u8>,
    /// Background for rendered output; alpha is a percentage
    #[arg(long, num_args = 4, value_names = ["R", "G", "B", "A"],
        default_values_t = [0u8, 0, 0, 100])]
    save_bg: Vec<u8>,
    /// Only save files, do not print to the terminal
    #[arg(long, default_value_t = false, action = ArgAction::SetTrue)]
    only_save: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if cli.save.only_save && !cli.save.wants_files() {
        bail!("--only-save needs at least one of --save-txt, --save-img or --save-gif");
    }

    let options = cli.settings.to_options(&cli.save)?;
    let font = cli.save.load_font()?;
    let mut converter = Converter::new(&options)?;
    if let Some(font) = &font {
        converter = converter.with_rasterizer(font);
    }

    for input in expand_inputs(&cli.inputs)? {
        convert_input(&converter, &input, &cli.save)
            .with_context(|| format!("failed to convert {input}"))?;
    }

    Ok(())
}

fn convert_input(converter: &Converter<'_>, input: &str, save: &SaveSettings) -> Result<()> {
    let bytes = acquire(input)?;
    let format = aic_render::sniff(&bytes)?;
    debug!("{input}: detected {}", format.mime_type());

    let frames = aic_render::decode(&bytes)?;
    let stem = output_stem(input);

    if format.is_animated() {
        convert_animation(converter, &frames, &stem, save)
    } else {
        convert_still(converter, &frames[0], &stem, save)
    }
}

fn convert_still(
    converter: &Converter<'_>,
    frame: &SourceFrame,
    stem: &str,
    save: &SaveSettings,
) -> Result<()> {
    let grid = converter.convert_frame(&frame.grid)?;
    info!("converted {stem} to {}x{} characters", grid.width, grid.height);

    if !save.only_save {
        print_grid(&mut io::stdout().lock(), &grid)?;
    }

    if let Some(dir) = &save.save_txt {
        let path = output_path(dir, stem, "txt")?;
        let mut file = BufWriter::new(
            File::create(&path).with_context(|| format!("failed to create {path:?}"))?,
        );
        for row in grid.rows() {
            writeln!(file, "{row}")?;
        }
        file.flush()?;
        info!("saved {path:?}");
    }

    if let Some(dir) = &save.save_img {
        let image = converter.render_frame(&grid)?;
        let path = output_path(dir, stem, "png")?;
        image.save(&path).with_context(|| format!("failed to save {path:?}"))?;
        info!("saved {path:?}");
    }

    if save.save_gif.is_some() {
        warn!("--save-gif only applies to gif inputs, skipping {stem}");
    }

    Ok(())
}

fn convert_animation(
    converter: &Converter<'_>,
    frames: &[SourceFrame],
    stem: &str,
    save: &SaveSettings,
) -> Result<()> {
    let output = if save.save_gif.is_some() { FrameOutput::Raster } else { FrameOutput::Text };
    let series = converter.convert_sequence(frames, output)?;
    info!("converted {} frames of {stem} ({:?} total)", series.len(), series.total_duration());

    if save.save_txt.is_some() || save.save_img.is_some() {
        warn!("--save-txt and --save-img only apply to still images, skipping {stem}");
    }

    if let Some(dir) = &save.save_gif {
        let path = output_path(dir, stem, "gif")?;
        write_gif(&path, &series)?;
        info!("saved {path:?}");
    }

    if !save.only_save {
        play(&series)?;
    }

    Ok(())
}

fn print_grid(out: &mut impl Write, grid: &GlyphGrid) -> io::Result<()> {
    for row in grid.ansi_rows() {
        writeln!(out, "{row}")?;
    }
    out.flush()
}

/// Plays the frames once in the terminal, each held for its source delay.
fn play(series: &GlyphGridSeries) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for frame in series.frames() {
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        print_grid(&mut stdout, &frame.grid)?;
        thread::sleep(frame.delay);
    }
    Ok(())
}

fn write_gif(path: &Path, series: &GlyphGridSeries) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;

    let progress = ProgressBar::new(series.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames",
        )?
        .progress_chars("=> "),
    );

    for (index, frame) in series.frames().iter().enumerate() {
        let Some(raster) = frame.raster.clone() else {
            bail!("frame {} was not rendered", index + 1);
        };
        let millis = u32::try_from(frame.delay.as_millis()).unwrap_or(u32::MAX);
        let delay = Delay::from_numer_denom_ms(millis, 1);
        encoder
            .encode_frame(Frame::from_parts(raster, 0, 0, delay))
            .with_context(|| format!("failed to encode frame {}", index + 1))?;
        progress.inc(1);
    }

    progress.finish_and_clear();
    Ok(())
}

fn acquire(input: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if input == "-" {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            bail!("there is no input being piped to stdin");
        }
        stdin.lock().read_to_end(&mut bytes).context("unable to read piped input")?;
    } else if is_url(input) {
        info!("fetching {input}");
        let response = ureq::get(input).call().with_context(|| format!("can't fetch {input}"))?;
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .with_context(|| format!("failed to read fetched content from {input}"))?;
    } else {
        bytes = fs::read(input).with_context(|| format!("unable to open {input}"))?;
    }
    Ok(bytes)
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Replaces directory arguments with the files inside them, sorted by path.
fn expand_inputs(inputs: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = Path::new(input);
        if input == "-" || is_url(input) || !path.is_dir() {
            expanded.push(input.clone());
            continue;
        }

        let mut entries: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().to_path_buf())
            .collect();
        entries.sort();
        if entries.is_empty() {
            bail!("no files found in {path:?}");
        }
        expanded.extend(entries.into_iter().map(|entry| entry.to_string_lossy().into_owned()));
    }
    Ok(expanded)
}

fn output_stem(input: &str) -> String {
    if input == "-" {
        return "piped-img".into();
    }
    let name = input.trim_end_matches('/').rsplit('/').next().unwrap_or(input);
    let name = name.split(['?', '#']).next().unwrap_or(name);
    Path::new(name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "image".into())
}

fn output_path(dir: &Path, stem: &str, extension: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        bail!("save path {dir:?} is not a directory");
    }
    Ok(dir.join(format!("{stem}-ascii-art.{extension}")))
}

impl RenderSettings {
    fn to_options(&self, save: &SaveSettings) -> Result<ConversionOptions, AicError> {
        let glyphs = if self.braille {
            GlyphStrategy::braille(self.threshold)?
        } else if let Some(map) = &self.map {
            GlyphStrategy::Ramp(Ramp::new(map)?)
        } else if self.complex {
            GlyphStrategy::Ramp(Ramp::complex())
        } else {
            GlyphStrategy::Ramp(Ramp::simple())
        };

        let color = match (self.color, self.color_bg) {
            (true, true) => ColorMode::Background,
            (true, false) => ColorMode::Foreground,
            // Grayscale alone still prints shaded characters.
            (false, _) if self.grayscale => ColorMode::Foreground,
            (false, _) => ColorMode::None,
        };

        Ok(ConversionOptions {
            sizing: self.sizing()?,
            glyphs,
            negative: self.negative,
            color,
            grayscale: self.grayscale,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            dither: self.dither,
            style: save.style(),
        })
    }

    fn sizing(&self) -> Result<Sizing, AicError> {
        if let Some(dimensions) = &self.dimensions {
            return match dimensions.as_slice() {
                &[columns, rows] => Ok(Sizing::Dimensions { columns, rows }),
                _ => Err(AicError::Config("--dimensions takes a width and a height".into())),
            };
        }
        if let Some(width) = self.width {
            return Ok(Sizing::Width(width));
        }
        if let Some(height) = self.height {
            return Ok(Sizing::Height(height));
        }
        if self.full {
            let (columns, rows) = crossterm::terminal::size()
                .map_err(|err| AicError::Config(format!("unable to read terminal size: {err}")))?;
            // Leave a row for the shell prompt.
            let rows = rows.saturating_sub(1).max(1);
            return Ok(Sizing::Full { columns: columns.max(1) as u32, rows: rows as u32 });
        }
        Ok(Sizing::Default)
    }
}

impl SaveSettings {
    fn wants_files(&self) -> bool {
        self.save_txt.is_some() || self.save_img.is_some() || self.save_gif.is_some()
    }

    fn wants_raster(&self) -> bool {
        self.save_img.is_some() || self.save_gif.is_some()
    }

    fn style(&self) -> RasterStyle {
        let font_color = [self.font_color[0], self.font_color[1], self.font_color[2]];
        let alpha = ((self.save_bg[3].min(100) as u32 * 255 + 50) / 100) as u8;
        RasterStyle {
            font_color,
            background: [self.save_bg[0], self.save_bg[1], self.save_bg[2], alpha],
        }
    }

    fn load_font(&self) -> Result<Option<FontFace>> {
        let Some(path) = &self.font else {
            if !self.wants_raster() {
                return Ok(None);
            }
            let face = FontFace::builtin(self.font_size).context("unable to load built-in font")?;
            debug!("using built-in font: {face:?}");
            return Ok(Some(face));
        };

        let bytes = fs::read(path).with_context(|| format!("unable to open font file {path:?}"))?;
        let face = FontFace::from_bytes(&bytes, self.font_size)
            .with_context(|| format!("unable to load font file {path:?}"))?;
        debug!("loaded font {path:?}: {face:?}");
        Ok(Some(face))
    }
}
