use {
	crate::{error::ConversionFailed, FULLY_TRANSPARENT, PAL_ENTRIES, PAL_LEN, RGBA_SIZE, RGB_SIZE},
	core::iter,
	png::{AdaptiveFilterType, BitDepth, ColorType, Compression},
	std::{
		fs::{self, File},
		io::BufWriter,
		path::Path,
	},
};

/// Largest pixel count accepted from a PCX header. A corrupt header can claim up to
/// 65535x65535, which must fail that file rather than the allocator.
pub const MAX_PIXELS: usize = 2 * 89_478_485;

pub enum Pixels {
	/// One palette index per pixel, plus the palette as packed RGB triples.
	Indexed { indices: Box<[u8]>, palette: Box<[u8]> },
	/// Interleaved RGB, already full color.
	Rgb(Box<[u8]>),
}

pub struct SourceImage {
	pub width: usize,
	pub height: usize,
	pub pixels: Pixels,
}

pub struct OutputImage {
	pub width: usize,
	pub height: usize,
	pub colorType: ColorType,
	pub data: Box<[u8]>,
}

impl SourceImage {
	pub fn fromPCX(path: &Path) -> Result<Self, ConversionFailed> {
		let mut pcx = pcx::Reader::from_file(path).map_err(ConversionFailed::Decode)?;
		let (width, height) = (pcx.width() as usize, pcx.height() as usize);
		let pixels = if pcx.is_paletted() {
			let mut indices = pixelBuffer(width, height, 1)?;
			if width != 0 {
				for row in indices.chunks_exact_mut(width) {
					pcx.next_row_paletted(row).map_err(ConversionFailed::Decode)?;
				}
			}
			// 256-color palettes live after the pixel data, so this has to come last.
			let mut palette = vec![0; PAL_LEN];
			let numColors = pcx.read_palette(&mut palette).map_err(ConversionFailed::Decode)?;
			palette.truncate(numColors.min(PAL_ENTRIES) * RGB_SIZE);
			log::debug!("{}: {width}x{height}, {numColors} palette entries", path.display());
			Pixels::Indexed { indices, palette: palette.into_boxed_slice() }
		} else {
			let mut data = pixelBuffer(width, height, RGB_SIZE)?;
			if width != 0 {
				for row in data.chunks_exact_mut(width * RGB_SIZE) {
					pcx.next_row_rgb(row).map_err(ConversionFailed::Decode)?;
				}
			}
			log::debug!("{}: {width}x{height}, direct color", path.display());
			Pixels::Rgb(data)
		};
		Ok(Self { width, height, pixels })
	}

	/// With `transparency`, an indexed image becomes RGBA where exactly the pixels holding
	/// index `FULLY_TRANSPARENT` get zero alpha; their RGB still comes from the palette.
	/// Without it, the palette is flattened into RGB. Direct-color images pass through.
	#[must_use]
	pub fn transform(&self, transparency: bool) -> OutputImage {
		let &Self { width, height, ref pixels } = self;
		let (colorType, data) = match pixels {
			Pixels::Indexed { indices, palette } => {
				let colors = colorTable(palette);
				if transparency {
					let mut data = vec![0; indices.len() * RGBA_SIZE];
					for (&index, rgba) in iter::zip(indices.iter(), data.chunks_exact_mut(RGBA_SIZE)) {
						rgba[..RGB_SIZE].copy_from_slice(&colors[index as usize]);
						rgba[RGB_SIZE] = if index == FULLY_TRANSPARENT { u8::MIN } else { u8::MAX };
					}
					(ColorType::Rgba, data)
				} else {
					(ColorType::Rgb, indices.iter().flat_map(|&index| colors[index as usize]).collect())
				}
			}
			Pixels::Rgb(data) => (ColorType::Rgb, data.to_vec()),
		};
		OutputImage { width, height, colorType, data: data.into_boxed_slice() }
	}
}

// Checked before any pixel data is read.
fn pixelBuffer(width: usize, height: usize, channels: usize) -> Result<Box<[u8]>, ConversionFailed> {
	let tooLarge = || ConversionFailed::TooLarge { width, height };
	let pixels = width.checked_mul(height).filter(|&pixels| pixels <= MAX_PIXELS).ok_or_else(tooLarge)?;
	let len = pixels * channels;
	let mut buffer = Vec::new();
	buffer.try_reserve_exact(len).map_err(|_| tooLarge())?;
	buffer.resize(len, 0);
	Ok(buffer.into_boxed_slice())
}

// Indices past the end of a short palette read as black.
fn colorTable(palette: &[u8]) -> [[u8; RGB_SIZE]; PAL_ENTRIES] {
	let mut table = [[0; RGB_SIZE]; PAL_ENTRIES];
	for (entry, rgb) in iter::zip(table.iter_mut(), palette.chunks_exact(RGB_SIZE)) {
		entry.copy_from_slice(rgb);
	}
	table
}

impl OutputImage {
	/// Encodes losslessly at the strongest compression, with the filter picked per row.
	/// A half-written file is removed so the next run does not mistake it for fresh output.
	pub fn writePNG(&self, path: &Path) -> Result<(), ConversionFailed> {
		let file = File::create(path).map_err(ConversionFailed::Create)?;
		let result = self.encode(BufWriter::new(file));
		if result.is_err() {
			if let Err(err) = fs::remove_file(path) {
				log::warn!("{}: cannot remove partial output: {err}", path.display());
			}
		}
		result
	}

	fn encode(&self, stream: BufWriter<File>) -> Result<(), ConversionFailed> {
		let mut png = png::Encoder::new(stream, self.width as _, self.height as _);
		png.set_color(self.colorType);
		png.set_depth(BitDepth::Eight);
		png.set_compression(Compression::Best);
		png.set_adaptive_filter(AdaptiveFilterType::Adaptive);
		let mut writer = png.write_header()?;
		writer.write_image_data(&self.data)?;
		writer.finish()?;
		Ok(())
	}
}

pub fn convert(source: &Path, destination: &Path, transparency: bool) -> Result<(), ConversionFailed> {
	SourceImage::fromPCX(source)?.transform(transparency).writePNG(destination)
}
