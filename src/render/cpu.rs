use std::collections::VecDeque;
use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::assets::font::{TextBrushRgba8, TextLayoutEngine};
use crate::assets::gradient::LinearGradient;
use crate::foundation::core::{Affine, Canvas, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::blur::GaussianKernel;
use crate::render::surface::{FrameRGBA, SurfaceDrawer};
use crate::render::text::{Shadow, TextBlock, TextStyle};

const IMAGE_CACHE_CAPACITY: usize = 4;
const SHADOW_CACHE_CAPACITY: usize = 8;

/// Blurred shadow of one line, padded by the blur radius.
struct ShadowEntry {
    text: String,
    style: TextStyle,
    paint: vello_cpu::Image,
    pad: f64,
}

/// CPU rasterizer surface backed by `vello_cpu`.
pub struct CpuSurface {
    canvas: Canvas,
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    text: Option<TextLayoutEngine>,
    shadow_kernel: Option<(f64, GaussianKernel)>,
    images: VecDeque<(PreparedImage, vello_cpu::Image)>,
    gradients: Vec<(Rect, LinearGradient, vello_cpu::Image)>,
    shadows: VecDeque<ShadowEntry>,
}

impl CpuSurface {
    pub fn new(canvas: Canvas) -> ReelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::render("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::render("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ReelError::render("surface must be at least 1x1"));
        }
        Ok(Self {
            canvas,
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
            text: None,
            shadow_kernel: None,
            images: VecDeque::new(),
            gradients: Vec::new(),
            shadows: VecDeque::new(),
        })
    }

    /// Attach the font used for all text on this surface.
    pub fn with_text_engine(mut self, engine: TextLayoutEngine) -> Self {
        self.text = Some(engine);
        self
    }

    pub fn has_text_engine(&self) -> bool {
        self.text.is_some()
    }

    fn image_paint(&mut self, image: &PreparedImage) -> ReelResult<vello_cpu::Image> {
        if let Some(pos) = self.images.iter().position(|(k, _)| k.same_pixels(image)) {
            if let Some(entry) = self.images.remove(pos) {
                let paint = entry.1.clone();
                self.images.push_back(entry);
                return Ok(paint);
            }
        }
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = image_from_pixmap(pixmap);
        self.images.push_back((image.clone(), paint.clone()));
        while self.images.len() > IMAGE_CACHE_CAPACITY {
            self.images.pop_front();
        }
        Ok(paint)
    }

    fn gradient_paint(
        &mut self,
        rect: Rect,
        gradient: &LinearGradient,
    ) -> ReelResult<vello_cpu::Image> {
        if let Some((_, _, paint)) = self
            .gradients
            .iter()
            .find(|(r, g, _)| *r == rect && g == gradient)
        {
            return Ok(paint.clone());
        }
        let size = Canvas {
            width: rect.width().ceil() as u32,
            height: rect.height().ceil() as u32,
        };
        let origin = Vec2::new(rect.x0, rect.y0);
        let local = LinearGradient {
            start: gradient.start - origin,
            end: gradient.end - origin,
            stops: gradient.stops.clone(),
        };
        let raster = local.rasterize(size)?;
        let paint = image_from_pixmap(pixmap_from_premul_bytes(
            &raster.rgba8_premul,
            raster.width,
            raster.height,
        )?);
        self.gradients.push((rect, gradient.clone(), paint.clone()));
        Ok(paint)
    }

    fn shadow_kernel(&mut self, blur_px: f64) -> ReelResult<GaussianKernel> {
        if let Some((b, k)) = &self.shadow_kernel
            && *b == blur_px
        {
            return Ok(k.clone());
        }
        let k = GaussianKernel::for_shadow_blur(blur_px)?;
        self.shadow_kernel = Some((blur_px, k.clone()));
        Ok(k)
    }

    fn fill_image_rect(&mut self, paint: vello_cpu::Image, dest: Rect) -> ReelResult<()> {
        let (w, h) = image_paint_size(&paint)?;
        if w <= 0.0 || h <= 0.0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }
        let xf = Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / w, dest.height() / h);
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(xf));
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        Ok(())
    }
}

impl SurfaceDrawer for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn clear(&mut self, color: Rgba8Premul) -> ReelResult<()> {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ReelResult<()> {
        let paint = self.image_paint(image)?;
        self.fill_image_rect(paint, dest)
    }

    fn fill_gradient(&mut self, rect: Rect, gradient: &LinearGradient) -> ReelResult<()> {
        if rect.width() < 1.0 || rect.height() < 1.0 {
            return Ok(());
        }
        let paint = self.gradient_paint(rect, gradient)?;
        self.fill_image_rect(paint, rect)
    }

    fn measure_text(&mut self, text: &str, style: &TextStyle) -> ReelResult<f64> {
        let engine = self
            .text
            .as_mut()
            .ok_or_else(|| ReelError::render("no font configured for text"))?;
        engine.measure(text, style.font_size_px, style.bold)
    }

    fn draw_text(&mut self, block: &TextBlock) -> ReelResult<()> {
        if block.is_empty() || block.opacity <= 0.0 {
            return Ok(());
        }
        let style = block.style;
        let kernel = match style.shadow {
            Some(s) if s.blur_px > 0.0 => Some(self.shadow_kernel(s.blur_px)?),
            _ => None,
        };
        let engine = self
            .text
            .as_mut()
            .ok_or_else(|| ReelError::render("no font configured for text"))?;

        let opacity = block.opacity.min(1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        for line in &block.lines {
            let layout = engine.layout_line(
                &line.text,
                style.font_size_px,
                style.bold,
                brush_from(style.color),
            )?;
            let x = line.center.x - f64::from(layout.width()) / 2.0;
            let y = line.center.y - f64::from(layout.height()) / 2.0;

            if let Some(shadow) = style.shadow {
                let (paint, pad) = cached_shadow(&mut self.shadows, &line.text, &style, || {
                    shadow_paint(engine.font(), &layout, &shadow, kernel.as_ref())
                })?;
                let (sw, sh) = image_paint_size(&paint)?;
                self.ctx.set_transform(affine_to_cpu(Affine::translate((
                    x - pad + shadow.offset.x,
                    y - pad + shadow.offset.y,
                ))));
                self.ctx.set_paint(paint);
                self.ctx
                    .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, sw, sh));
            }

            self.ctx
                .set_transform(affine_to_cpu(Affine::translate((x, y))));
            fill_glyphs(&mut self.ctx, engine.font(), &layout, None);
        }

        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    fn capture(&mut self) -> ReelResult<FrameRGBA> {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Shadow paint for `text` in `style`, rendering it on a miss.
fn cached_shadow(
    cache: &mut VecDeque<ShadowEntry>,
    text: &str,
    style: &TextStyle,
    render: impl FnOnce() -> ReelResult<(vello_cpu::Image, f64)>,
) -> ReelResult<(vello_cpu::Image, f64)> {
    let pos = cache
        .iter()
        .position(|e| e.text == text && e.style == *style);
    if let Some(entry) = pos.and_then(|i| cache.remove(i)) {
        let hit = (entry.paint.clone(), entry.pad);
        cache.push_back(entry);
        return Ok(hit);
    }
    let (paint, pad) = render()?;
    cache.push_back(ShadowEntry {
        text: text.to_owned(),
        style: *style,
        paint: paint.clone(),
        pad,
    });
    while cache.len() > SHADOW_CACHE_CAPACITY {
        cache.pop_front();
    }
    Ok((paint, pad))
}

/// Render the glyphs of `layout` in the shadow color, blurred, padded by the blur radius.
fn shadow_paint(
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
    shadow: &Shadow,
    kernel: Option<&GaussianKernel>,
) -> ReelResult<(vello_cpu::Image, f64)> {
    let pad = kernel.map(GaussianKernel::radius).unwrap_or(0);
    let w = (f64::from(layout.width()).ceil() as u32 + 2 * pad).max(1);
    let h = (f64::from(layout.height()).ceil() as u32 + 2 * pad).max(1);
    let w16: u16 = w
        .try_into()
        .map_err(|_| ReelError::render("shadow width exceeds u16"))?;
    let h16: u16 = h
        .try_into()
        .map_err(|_| ReelError::render("shadow height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_transform(affine_to_cpu(Affine::translate((
        f64::from(pad),
        f64::from(pad),
    ))));
    fill_glyphs(&mut ctx, font, layout, Some(color_to_cpu(shadow.color)));
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    let bytes = match kernel {
        Some(k) => k.apply(pixmap.data_as_u8_slice(), w, h)?,
        None => pixmap.data_as_u8_slice().to_vec(),
    };
    let paint = image_from_pixmap(pixmap_from_premul_bytes(&bytes, w, h)?);
    Ok((paint, f64::from(pad)))
}

fn fill_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
    paint_override: Option<vello_cpu::peniko::Color>,
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let color = paint_override.unwrap_or_else(|| {
                let b = run.style().brush;
                vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a)
            });
            ctx.set_paint(color);
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn unpremultiply(c: Rgba8Premul) -> [u8; 4] {
    if c.a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |v: u8| -> u8 {
        ((u32::from(v) * 255 + u32::from(c.a) / 2) / u32::from(c.a)).min(255) as u8
    };
    [un(c.r), un(c.g), un(c.b), c.a]
}

fn color_to_cpu(c: Rgba8Premul) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = unpremultiply(c);
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn brush_from(c: Rgba8Premul) -> TextBrushRgba8 {
    let [r, g, b, a] = unpremultiply(c);
    TextBrushRgba8 { r, g, b, a }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_from_pixmap(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::render("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn image_paint_size(image: &vello_cpu::Image) -> ReelResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => Err(ReelError::render(
            "cpu surface does not support opaque image ids",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
