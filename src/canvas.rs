use std::io;
use std::io::Write;
use std::fs::File;
use std::path::Path;

use crate::color::Color;

/// No line of a PPM file may be longer than this.
const PPM_LINE_WIDTH: usize = 70;

/// A canvas for drawing pixels.
///
/// The canvas stores the resultant color for each camera ray. Once rendering
/// finishes, the `Canvas` can be saved as a plain (P3) PPM image.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened vector.
    pixels: Vec<Color>,
}

/// Scales a channel to `0..=255`.
fn channel_byte(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }

    (v * 255.0).clamp(0.0, 255.0).round() as u8
}

impl Canvas {
    /// Creates a black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// Saves a canvas to a PPM file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut out = io::BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;
        out.flush()
    }

    /// Writes the canvas in PPM format.
    ///
    /// Every image row starts on a new line, and long rows are wrapped so that
    /// no line exceeds 70 columns.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.pixels.chunks(self.width.max(1)) {
            let mut line = String::new();

            for pixel in row {
                for v in [pixel.r, pixel.g, pixel.b].iter() {
                    let value = channel_byte(*v).to_string();

                    if !line.is_empty() && line.len() + 1 + value.len() > PPM_LINE_WIDTH {
                        writeln!(out, "{}", line)?;
                        line.clear();
                    }

                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&value);
                }
            }

            writeln!(out, "{}", line)?;
        }

        Ok(())
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel and `x`
    /// the column, both zero-indexed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use voxel_optics::color::Color;
    /// # use voxel_optics::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`, or `None` if the
    /// location is out of bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Copies a rendered row into the canvas.
    pub fn write_row(&mut self, y: usize, row: &[Color]) {
        for (x, pixel) in row.iter().enumerate() {
            self.write_pixel(x, y, pixel);
        }
    }
}

#[test]
fn ppm_header_and_clamping() {
    let mut c = Canvas::new(3, 2);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(1, 0, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(2, 1, &Color::rgb(-0.5, 0.0, 1.0));

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "P3");
    assert_eq!(lines[1], "3 2");
    assert_eq!(lines[2], "255");
    assert_eq!(lines[3], "255 0 0 0 128 0 0 0 0");
    assert_eq!(lines[4], "0 0 0 0 0 0 0 0 255");
}

#[test]
fn ppm_lines_are_wrapped() {
    let mut c = Canvas::new(10, 1);
    for x in 0..10 {
        c.write_pixel(x, 0, &Color::rgb(1.0, 0.8, 0.6));
    }

    let mut out = Vec::new();
    c.write_ppm(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.lines().all(|l| l.len() <= 70));
    assert_eq!(text.lines().count(), 5);
    assert!(text.ends_with('\n'));
}

#[test]
fn out_of_bounds_pixels_are_ignored() {
    let mut c = Canvas::new(2, 2);
    c.write_pixel(5, 0, &Color::red());

    assert_eq!(c.read_pixel(5, 0), None);
    assert_eq!(c.read_pixel(1, 1), Some(Color::black()));
}
