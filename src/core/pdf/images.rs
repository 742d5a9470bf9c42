use std::io::Cursor;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::models::ReportError;

// ─── 图像水印启发式常量 ──────────────────────────────────────────────────────
//
// 这些阈值针对已知的研报水印外观（页面左侧的浅灰色横排小字）调校，
// 不是通用的图像处理算法。调整前先确认目标水印的实际灰度和位置。

/// 水印只出现在页面左侧：仅扫描宽度的前 40%
const BAND_X_RATIO: f64 = 0.4;
/// 水印灰度下限（比正文深色文字浅）
const GRAY_MIN: u8 = 150;
/// 水印灰度上限（比纸面白色深）
const GRAY_MAX: u8 = 235;
/// 一行至少命中这么多像素才算水印行
const MIN_ROW_HITS: u32 = 8;
/// 水印条带的合理高度范围（像素）
const MIN_BAND_HEIGHT: u32 = 10;
const MAX_BAND_HEIGHT: u32 = 60;
/// 水印条带的合理宽度范围（像素）
const MIN_BAND_WIDTH: u32 = 50;
const MAX_BAND_WIDTH: u32 = 400;
/// 覆盖时向外扩张的边距（像素）
const PAINT_MARGIN: u32 = 5;

/// A detected watermark band inside one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Band {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

/// 内嵌图片水印清理器
///
/// 文本模式未命中时的回退：水印被栅格化进页面图片（扫描版研报）的情况。
/// 对每页的 Image XObject 解码，检测左侧浅灰条带并用周边背景色覆盖，
/// 再以 JPEG 重新编码写回对象流。
pub struct ImageCleaner;

impl ImageCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean every image XObject referenced by one page.
    ///
    /// Returns the number of regions painted over. Streams that cannot be
    /// decoded (unsupported filter or color space) are left untouched.
    pub fn clean_page_images(
        &self,
        doc: &mut Document,
        page_id: ObjectId,
    ) -> Result<usize, ReportError> {
        let image_ids = collect_image_xobjects(doc, page_id);
        let mut painted_total = 0usize;

        for id in image_ids {
            let Some(mut img) = decode_image_stream(doc, id) else {
                debug!(object = ?id, "skipping undecodable image stream");
                continue;
            };

            let painted = self.clean_image(&mut img);
            if painted == 0 {
                continue;
            }
            painted_total += painted;
            replace_stream_with_jpeg(doc, id, &img)?;
        }

        Ok(painted_total)
    }

    /// Detect and paint over watermark bands in a decoded image.
    /// Returns the number of bands painted.
    pub fn clean_image(&self, img: &mut RgbImage) -> usize {
        let bands = detect_bands(img);
        for band in &bands {
            let background = sample_background(img, band);
            paint_band(img, band, background);
        }
        bands.len()
    }
}

impl Default for ImageCleaner {
    fn default() -> Self {
        Self::new()
    }
}

// ─── 检测与覆盖 ─────────────────────────────────────────────────────────────

/// ITU-R 601 亮度近似
fn luma(p: &Rgb<u8>) -> u8 {
    let Rgb([r, g, b]) = *p;
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

fn is_watermark_gray(p: &Rgb<u8>) -> bool {
    let l = luma(p);
    (GRAY_MIN..=GRAY_MAX).contains(&l)
}

/// Scan the left band for horizontal runs of watermark-gray rows.
///
/// A row counts when enough pixels in the left `BAND_X_RATIO` of the image
/// fall in the watermark gray range; consecutive counted rows form a band,
/// kept only when its height and column extent look like the known
/// watermark line.
fn detect_bands(img: &RgbImage) -> Vec<Band> {
    let (width, height) = img.dimensions();
    let scan_width = ((width as f64) * BAND_X_RATIO) as u32;
    if scan_width == 0 || height == 0 {
        return Vec::new();
    }

    // Per-row hit count and column extent
    let mut row_hits = vec![0u32; height as usize];
    let mut row_min_x = vec![u32::MAX; height as usize];
    let mut row_max_x = vec![0u32; height as usize];
    for y in 0..height {
        for x in 0..scan_width {
            if is_watermark_gray(img.get_pixel(x, y)) {
                row_hits[y as usize] += 1;
                row_min_x[y as usize] = row_min_x[y as usize].min(x);
                row_max_x[y as usize] = row_max_x[y as usize].max(x);
            }
        }
    }

    let mut bands = Vec::new();
    let mut y = 0u32;
    while y < height {
        if row_hits[y as usize] < MIN_ROW_HITS {
            y += 1;
            continue;
        }
        // Extend the run of marked rows
        let start = y;
        let mut x0 = u32::MAX;
        let mut x1 = 0u32;
        while y < height && row_hits[y as usize] >= MIN_ROW_HITS {
            x0 = x0.min(row_min_x[y as usize]);
            x1 = x1.max(row_max_x[y as usize]);
            y += 1;
        }
        let band_height = y - start;
        let band_width = x1.saturating_sub(x0) + 1;

        if (MIN_BAND_HEIGHT..=MAX_BAND_HEIGHT).contains(&band_height)
            && (MIN_BAND_WIDTH..=MAX_BAND_WIDTH).contains(&band_width)
        {
            bands.push(Band {
                x0,
                y0: start,
                x1,
                y1: y - 1,
            });
        }
    }
    bands
}

/// Average the pixels one margin-row above and below the band; white when
/// the band touches the image edge on both sides.
fn sample_background(img: &RgbImage, band: &Band) -> Rgb<u8> {
    let (width, height) = img.dimensions();
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    let mut sample_row = |y: u32| {
        for x in band.x0..=band.x1.min(width - 1) {
            let p = img.get_pixel(x, y);
            sum[0] += p[0] as u64;
            sum[1] += p[1] as u64;
            sum[2] += p[2] as u64;
            count += 1;
        }
    };

    if band.y0 > PAINT_MARGIN {
        sample_row(band.y0 - PAINT_MARGIN - 1);
    }
    if band.y1 + PAINT_MARGIN + 1 < height {
        sample_row(band.y1 + PAINT_MARGIN + 1);
    }

    if count == 0 {
        return Rgb([255, 255, 255]);
    }
    Rgb([
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ])
}

/// Fill the band rectangle (expanded by the margin) with the background color
fn paint_band(img: &mut RgbImage, band: &Band, color: Rgb<u8>) {
    let (width, height) = img.dimensions();
    let x0 = band.x0.saturating_sub(PAINT_MARGIN);
    let y0 = band.y0.saturating_sub(PAINT_MARGIN);
    let x1 = (band.x1 + PAINT_MARGIN).min(width - 1);
    let y1 = (band.y1 + PAINT_MARGIN).min(height - 1);
    for y in y0..=y1 {
        for x in x0..=x1 {
            img.put_pixel(x, y, color);
        }
    }
}

// ─── lopdf 对象流读写 ───────────────────────────────────────────────────────

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj.as_reference() {
        Ok(id) => doc.get_object(id).unwrap_or(obj),
        Err(_) => obj,
    }
}

/// Object ids of every Image XObject referenced by the page's resources
fn collect_image_xobjects(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut ids = Vec::new();
    let (resources, resource_ids) = doc.get_page_resources(page_id);

    let mut dicts = Vec::new();
    if let Some(dict) = resources {
        dicts.push(dict);
    }
    for rid in resource_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object(rid) {
            dicts.push(dict);
        }
    }

    for dict in dicts {
        let Ok(xobjects) = dict.get(b"XObject") else {
            continue;
        };
        let Object::Dictionary(xobjects) = resolve(doc, xobjects) else {
            continue;
        };
        for (_name, entry) in xobjects.iter() {
            let Ok(id) = entry.as_reference() else {
                continue;
            };
            if let Ok(Object::Stream(stream)) = doc.get_object(id) {
                let is_image = stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name_str)
                    .map(|s| s == "Image")
                    .unwrap_or(false);
                if is_image {
                    ids.push(id);
                }
            }
        }
    }
    ids
}

/// Decode an Image XObject stream into RGB pixels.
///
/// Supports DCTDecode (JPEG) and plain FlateDecode with 8-bit DeviceRGB or
/// DeviceGray samples; anything else returns `None` and the stream is left
/// as-is.
fn decode_image_stream(doc: &Document, id: ObjectId) -> Option<RgbImage> {
    let Ok(Object::Stream(stream)) = doc.get_object(id) else {
        return None;
    };

    let filter = stream
        .dict
        .get(b"Filter")
        .ok()
        .map(|f| resolve(doc, f))
        .and_then(|f| match f {
            Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
            Object::Array(arr) => arr
                .first()
                .and_then(|o| o.as_name_str().ok())
                .map(|s| s.to_string()),
            _ => None,
        });

    match filter.as_deref() {
        Some("DCTDecode") => image::load_from_memory(&stream.content)
            .ok()
            .map(|img| img.to_rgb8()),
        Some("FlateDecode") | None => {
            let raw = if filter.is_some() {
                stream.decompressed_content().ok()?
            } else {
                stream.content.clone()
            };
            let width = stream.dict.get(b"Width").ok()?.as_i64().ok()? as u32;
            let height = stream.dict.get(b"Height").ok()?.as_i64().ok()? as u32;
            let bpc = stream
                .dict
                .get(b"BitsPerComponent")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(8);
            if bpc != 8 {
                return None;
            }
            let colorspace = stream
                .dict
                .get(b"ColorSpace")
                .ok()
                .map(|c| resolve(doc, c))
                .and_then(|c| c.as_name_str().ok())
                .unwrap_or("DeviceRGB")
                .to_string();
            match colorspace.as_str() {
                "DeviceRGB" => RgbImage::from_raw(width, height, raw),
                "DeviceGray" => {
                    let rgb: Vec<u8> = raw.iter().flat_map(|&g| [g, g, g]).collect();
                    RgbImage::from_raw(width, height, rgb)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Re-encode the cleaned pixels as JPEG and rewrite the stream in place
fn replace_stream_with_jpeg(
    doc: &mut Document,
    id: ObjectId,
    img: &RgbImage,
) -> Result<(), ReportError> {
    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Jpeg)
        .map_err(|e| ReportError::ImageProcessing(format!("JPEG 重编码失败: {}", e)))?;

    let Ok(Object::Stream(stream)) = doc.get_object_mut(id) else {
        return Err(ReportError::ImageProcessing(format!(
            "对象 {:?} 不是图像流",
            id
        )));
    };
    stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    stream
        .dict
        .set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    stream.dict.set("BitsPerComponent", 8);
    stream.dict.set("Width", img.width() as i64);
    stream.dict.set("Height", img.height() as i64);
    stream.dict.remove(b"DecodeParms");
    stream.set_content(encoded);
    Ok(())
}
