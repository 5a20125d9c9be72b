// Copyright 2024 pyke.io
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single-flight fetch + decode pipeline backing [`super::ImageCache`].
//!
//! Grounded on `examples/other_examples/d09d5f20_mrtolkien-t-koma__t-koma-gateway-src-chat-history.rs.rs`,
//! the only pack example that decodes raster images with the `image` crate (there via
//! `image::ImageReader` + `imageops` for resize/recompress; here via its frame-enumerating GIF
//! decoder for animation support).

use std::io::Cursor;

use image::{codecs::gif::GifDecoder, AnimationDecoder, GenericImageView};
use thiserror::Error;

/// One decoded animation frame.
#[derive(Debug, Clone)]
pub struct Frame {
	pub pixels: Vec<u8>,
	pub width: u32,
	pub height: u32,
	/// Display duration, floored at 20ms per §4.2.
	pub delay_ms: u32
}

/// Errors that can occur while fetching or decoding an image. Recovered locally by
/// [`super::ImageCache`] — never propagated to callers as an `Err`, only as [`super::Handle::Failed`].
#[derive(Debug, Error)]
pub enum FetchError {
	#[error("http error fetching image: {0}")]
	Http(#[from] reqwest::Error),
	#[error("failed to decode image: {0}")]
	Decode(#[from] image::ImageError)
}

const FRAME_DELAY_FLOOR_MS: u32 = 20;

/// Fetches `url` and decodes every frame it contains. The first frame is always present on
/// success; `frames.len() > 1` implies an animated image.
pub async fn fetch_and_decode(client: &reqwest::Client, url: &str) -> Result<Vec<Frame>, FetchError> {
	let bytes = client.get(url).send().await?.error_for_status()?.bytes().await?;
	decode_bytes(&bytes)
}

fn decode_bytes(bytes: &[u8]) -> Result<Vec<Frame>, FetchError> {
	if let Ok(gif) = GifDecoder::new(Cursor::new(bytes)) {
		let frames: Result<Vec<_>, _> = gif.into_frames().collect();
		let frames = frames?;
		if !frames.is_empty() {
			return Ok(frames
				.into_iter()
				.map(|frame| {
					let delay_ms = frame.delay().numer_denom_ms().0.max(FRAME_DELAY_FLOOR_MS);
					let buffer = frame.into_buffer();
					let (width, height) = (buffer.width(), buffer.height());
					Frame { pixels: buffer.into_raw(), width, height, delay_ms }
				})
				.collect());
		}
	}

	let decoded = image::load_from_memory(bytes)?;
	let (width, height) = decoded.dimensions();
	Ok(vec![Frame { pixels: decoded.to_rgba8().into_raw(), width, height, delay_ms: FRAME_DELAY_FLOOR_MS }])
}

#[cfg(test)]
mod tests {
	use super::*;

	fn solid_png(width: u32, height: u32) -> Vec<u8> {
		let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
		let mut buf = Vec::new();
		image::DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png).unwrap();
		buf
	}

	#[test]
	fn decodes_single_static_frame() {
		let bytes = solid_png(4, 4);
		let frames = decode_bytes(&bytes).unwrap();
		assert_eq!(frames.len(), 1);
		assert_eq!(frames[0].width, 4);
		assert_eq!(frames[0].delay_ms, FRAME_DELAY_FLOOR_MS);
	}

	#[test]
	fn rejects_garbage_bytes() {
		assert!(decode_bytes(b"not an image").is_err());
	}
}
