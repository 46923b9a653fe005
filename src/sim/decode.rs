//! Track decoder: level artwork → tile grid
//!
//! Colour encoding (all fully opaque):
//! - white: not track
//! - red: start tile
//! - green: finish tile
//! - anything else: track

use glam::IVec2;

use super::level::Track;
use crate::error::LevelError;

const WHITE: [u8; 4] = [0xff, 0xff, 0xff, 0xff];
const RED: [u8; 4] = [0xff, 0x00, 0x00, 0xff];
const GREEN: [u8; 4] = [0x00, 0xff, 0x00, 0xff];

/// RGBA8 pixel buffer, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, LevelError> {
        let expected = width as usize * height as usize * 4;
        if expected == 0 {
            return Err(LevelError::EmptyImage);
        }
        if data.len() != expected {
            return Err(LevelError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`; out of bounds reads as white
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 4] {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return WHITE;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Any fully opaque, non-white pixel (start and finish included)
#[inline]
fn is_track(px: [u8; 4]) -> bool {
    px[3] == 0xff && px != WHITE
}

fn record_marker(
    slot: &mut Option<IVec2>,
    marker: &'static str,
    at: IVec2,
) -> Result<(), LevelError> {
    match *slot {
        Some(first) => Err(LevelError::DuplicateMarker {
            marker,
            first,
            second: at,
        }),
        None => {
            *slot = Some(at);
            Ok(())
        }
    }
}

/// Decode a level image into its track grid.
///
/// Missing or duplicated start/finish pixels are authoring errors and fail
/// the decode. Decoding the same pixels twice yields identical tracks.
pub fn decode_track(pixmap: &Pixmap) -> Result<Track, LevelError> {
    let (w, h) = (pixmap.width as i32, pixmap.height as i32);
    let mut cells = Vec::with_capacity((w * h) as usize);
    let mut start = None;
    let mut finish = None;

    for y in 0..h {
        for x in 0..w {
            let px = pixmap.pixel(x, y);
            if px == RED {
                record_marker(&mut start, "start", IVec2::new(x, y))?;
            } else if px == GREEN {
                record_marker(&mut finish, "finish", IVec2::new(x, y))?;
            }
            cells.push(is_track(px));
        }
    }

    let start = start.ok_or(LevelError::MissingStart)?;
    let finish = finish.ok_or(LevelError::MissingFinish)?;

    let track = Track::from_mask(pixmap.width, pixmap.height, cells, start, finish)?;
    log::debug!(
        "Decoded {}x{} track: start {} facing {:?}, finish {} facing {:?}",
        pixmap.width,
        pixmap.height,
        track.start,
        track.start_facing,
        track.finish,
        track.finish_facing
    );
    Ok(track)
}

/// Decode PNG (or any format `image` was built with) into a pixmap
pub fn decode_png(bytes: &[u8]) -> Result<Pixmap, LevelError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = image.dimensions();
    Pixmap::new(width, height, image.into_raw())
}

/// Build a pixmap from rows of `.` (white), `#` (grey track), `S` (red),
/// `F` (green) and `t` (translucent grey)
#[cfg(test)]
pub(crate) fn pixmap_from_ascii(rows: &[&str]) -> Pixmap {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for row in rows {
        assert_eq!(row.len() as u32, width, "ragged test level");
        for ch in row.chars() {
            let px = match ch {
                '.' => WHITE,
                '#' => [0x80, 0x80, 0x80, 0xff],
                'S' => RED,
                'F' => GREEN,
                't' => [0x80, 0x80, 0x80, 0x40],
                other => panic!("unknown level glyph {other:?}"),
            };
            data.extend_from_slice(&px);
        }
    }
    Pixmap::new(width, height, data).unwrap()
}

/// PNG bytes for an ASCII level, same glyphs as [`pixmap_from_ascii`]
#[cfg(test)]
pub(crate) fn png_from_ascii(rows: &[&str]) -> Vec<u8> {
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    let pixmap = pixmap_from_ascii(rows);
    let img = RgbaImage::from_raw(pixmap.width, pixmap.height, pixmap.data).unwrap();
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Direction, TileKind};
    use proptest::prelude::*;

    #[test]
    fn test_straight_line() {
        let track = decode_track(&pixmap_from_ascii(&[
            "...", //
            "S#F", //
            "...",
        ]))
        .unwrap();
        assert_eq!(track.start, IVec2::new(0, 1));
        assert_eq!(track.finish, IVec2::new(2, 1));
        assert_eq!(track.start_facing, Direction::Right);
        assert_eq!(track.finish_facing, Direction::Left);
        for x in 0..3 {
            assert_eq!(track.tile(IVec2::new(x, 1)), TileKind::Horizontal);
            assert_eq!(track.tile(IVec2::new(x, 0)), TileKind::Empty);
        }
        assert_eq!(track.tile(IVec2::new(-1, 1)), TileKind::Empty);
    }

    #[test]
    fn test_junctions_and_turns() {
        let track = decode_track(&pixmap_from_ascii(&[
            "..#..", //
            "S###.", //
            "..#..", //
            "..##F",
        ]))
        .unwrap();
        assert_eq!(track.tile(IVec2::new(2, 1)), TileKind::Cross);
        assert_eq!(track.tile(IVec2::new(3, 1)), TileKind::Horizontal);
        assert_eq!(track.tile(IVec2::new(2, 3)), TileKind::TurnUpRight);
        assert_eq!(track.tile(IVec2::new(2, 0)), TileKind::Vertical);
        assert_eq!(track.finish_facing, Direction::Left);
    }

    #[test]
    fn test_vertical_endpoints() {
        let track = decode_track(&pixmap_from_ascii(&[
            ".S.", //
            ".#.", //
            ".F.",
        ]))
        .unwrap();
        assert_eq!(track.start_facing, Direction::Down);
        assert_eq!(track.finish_facing, Direction::Up);
    }

    #[test]
    fn test_missing_markers() {
        let err = decode_track(&pixmap_from_ascii(&["##F"])).unwrap_err();
        assert!(matches!(err, LevelError::MissingStart));
        let err = decode_track(&pixmap_from_ascii(&["S##"])).unwrap_err();
        assert!(matches!(err, LevelError::MissingFinish));
    }

    #[test]
    fn test_duplicate_marker() {
        let err = decode_track(&pixmap_from_ascii(&["S#S#F"])).unwrap_err();
        assert!(matches!(err, LevelError::DuplicateMarker { marker: "start", .. }));
    }

    #[test]
    fn test_endpoint_on_turn_is_rejected() {
        let err = decode_track(&pixmap_from_ascii(&[
            "S#.", //
            "#..", //
            "F..",
        ]))
        .unwrap_err();
        assert!(matches!(err, LevelError::EndpointNotStraight { marker: "start", .. }));
    }

    #[test]
    fn test_translucent_pixels_are_not_track() {
        let track = decode_track(&pixmap_from_ascii(&["S#tF#"])).unwrap();
        assert_eq!(track.tile(IVec2::new(2, 0)), TileKind::Empty);
        assert_eq!(track.finish_facing, Direction::Right);
    }

    #[test]
    fn test_bad_buffer() {
        assert!(matches!(Pixmap::new(0, 4, vec![]), Err(LevelError::EmptyImage)));
        assert!(matches!(
            Pixmap::new(2, 2, vec![0; 15]),
            Err(LevelError::BufferSize { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_png_round_trip_through_image() {
        use image::{ImageFormat, Rgba, RgbaImage};
        use std::io::Cursor;

        let mut img = RgbaImage::from_pixel(3, 1, Rgba(WHITE));
        img.put_pixel(0, 0, Rgba(RED));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(2, 0, Rgba(GREEN));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let track = decode_track(&decode_png(&bytes).unwrap()).unwrap();
        assert_eq!(track.start, IVec2::new(0, 0));
        assert_eq!(track.finish, IVec2::new(2, 0));
    }

    #[test]
    fn test_garbage_png() {
        assert!(matches!(decode_png(b"not a png"), Err(LevelError::Image(_))));
    }

    /// Random grid with a red start and green finish planted in the first
    /// row. Each endpoint gets one track cell beside it and none below, so it
    /// always classifies as a straight piece and the level decodes.
    fn arb_level() -> impl Strategy<Value = Pixmap> {
        (3u32..10, 2u32..10).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<bool>(), (w * h) as usize).prop_map(move |mut cells| {
                let w = w as usize;
                cells[1] = true;
                cells[w - 2] = true;
                cells[w] = false;
                cells[2 * w - 1] = false;

                let mut data = Vec::with_capacity(cells.len() * 4);
                for (i, on) in cells.iter().enumerate() {
                    let px = if i == 0 {
                        RED
                    } else if i == w - 1 {
                        GREEN
                    } else if *on {
                        [0x30, 0x60, 0x90, 0xff]
                    } else {
                        WHITE
                    };
                    data.extend_from_slice(&px);
                }
                Pixmap::new(w as u32, h, data).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn prop_neighbor_tests_are_symmetric(pixmap in arb_level()) {
            let track = decode_track(&pixmap);
            prop_assert!(track.is_ok(), "level failed to decode: {:?}", track.err());
            let track = track.unwrap();

            for y in 0..pixmap.height() as i32 {
                for x in 0..pixmap.width() as i32 {
                    let a = IVec2::new(x, y);
                    for dir in Direction::ALL {
                        let b = a + dir.delta();
                        prop_assert_eq!(track.neighbors(a).get(dir), track.is_track_cell(b));
                        if track.in_bounds(b) {
                            prop_assert_eq!(
                                track.neighbors(b).get(dir.reversed()),
                                track.is_track_cell(a)
                            );
                        }
                    }
                }
            }
        }

        #[test]
        fn prop_decode_is_idempotent(pixmap in arb_level()) {
            let first = decode_track(&pixmap);
            let second = decode_track(&pixmap);
            prop_assert!(first.is_ok() && second.is_ok());
            prop_assert_eq!(first.unwrap(), second.unwrap());
        }

        #[test]
        fn prop_endpoint_facing_matches_kind(pixmap in arb_level()) {
            let track = decode_track(&pixmap);
            prop_assert!(track.is_ok(), "level failed to decode: {:?}", track.err());
            let track = track.unwrap();
            for (at, facing) in [
                (track.start, track.start_facing),
                (track.finish, track.finish_facing),
            ] {
                match track.tile(at) {
                    TileKind::Horizontal => {
                        prop_assert!(matches!(facing, Direction::Left | Direction::Right))
                    }
                    TileKind::Vertical => {
                        prop_assert!(matches!(facing, Direction::Up | Direction::Down))
                    }
                    other => {
                        prop_assert!(false, "endpoint on {:?}", other)
                    }
                }
            }
        }
    }
}
