use anyhow::Result;
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    imgproc,
    prelude::*,
};
use piano_core::{HandPress, Key, KeyLayout, PressEvent};
use piano_shared::{HandLandmarks, Position};

const WHITE_OUTLINE: (f64, f64, f64) = (255.0, 255.0, 255.0);
const WHITE_PRESSED: (f64, f64, f64) = (193.0, 182.0, 255.0); // Pink
const BLACK_FILL: (f64, f64, f64) = (0.0, 0.0, 0.0);
const BLACK_PRESSED: (f64, f64, f64) = (144.0, 238.0, 144.0); // Light green
const TIP_COLORS: [(f64, f64, f64); 2] = [(50.0, 50.0, 10.0), (100.0, 50.0, 50.0)];
const BONE_COLOR: (f64, f64, f64) = (224.0, 224.0, 224.0);
const JOINT_COLOR: (f64, f64, f64) = (0.0, 0.0, 255.0);

/// Landmark pairs joined when drawing a hand: palm outline, then each finger
const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1),
    (0, 5),
    (5, 9),
    (9, 13),
    (13, 17),
    (0, 17),
    (1, 2),
    (2, 3),
    (3, 4),
    (5, 6),
    (6, 7),
    (7, 8),
    (9, 10),
    (10, 11),
    (11, 12),
    (13, 14),
    (14, 15),
    (15, 16),
    (17, 18),
    (18, 19),
    (19, 20),
];

fn bgr((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

fn point(pos: Position) -> Point {
    Point::new(pos.x as i32, pos.y as i32)
}

fn key_rect(key: &Key) -> Rect {
    let b = key.bounds;
    Rect::new(b.xmin, b.ymin, b.xmax - b.xmin, b.ymax - b.ymin)
}

fn fill_key(canvas: &mut Mat, key: &Key, color: (f64, f64, f64)) -> Result<()> {
    imgproc::rectangle(canvas, key_rect(key), bgr(color), -1, imgproc::LINE_8, 0)?;
    Ok(())
}

fn draw_skeleton(canvas: &mut Mat, hand: &HandLandmarks) -> Result<()> {
    for (from, to) in HAND_CONNECTIONS {
        imgproc::line(
            canvas,
            point(hand.position(from)),
            point(hand.position(to)),
            bgr(BONE_COLOR),
            2,
            imgproc::LINE_8,
            0,
        )?;
    }
    for landmark in hand.landmarks() {
        imgproc::circle(
            canvas,
            point(landmark.position),
            3,
            bgr(JOINT_COLOR),
            -1,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}

/// Compose the piano overlay on a copy of `frame`
pub fn render(
    frame: &Mat,
    layout: &KeyLayout,
    presses: &[PressEvent],
    landmarks: &[HandLandmarks],
    hands: &[HandPress],
    fps: f64,
) -> Result<Mat> {
    let mut canvas = frame.try_clone()?;
    let is_pressed = |key: &Key| {
        presses.contains(&PressEvent {
            index: key.index,
            color: key.color,
        })
    };

    // White keys first so the black keys end up on top
    for key in layout.white_keys() {
        if is_pressed(key) {
            fill_key(&mut canvas, key, WHITE_PRESSED)?;
        }
        imgproc::rectangle(
            &mut canvas,
            key_rect(key),
            bgr(WHITE_OUTLINE),
            2,
            imgproc::LINE_8,
            0,
        )?;
    }

    for key in layout.black_keys() {
        let color = if is_pressed(key) {
            BLACK_PRESSED
        } else {
            BLACK_FILL
        };
        fill_key(&mut canvas, key, color)?;
    }

    for hand in landmarks {
        draw_skeleton(&mut canvas, hand)?;
    }

    for (hand, press) in hands.iter().enumerate() {
        let color = TIP_COLORS[hand % TIP_COLORS.len()];
        for (_, tip) in press.pressed_tips() {
            imgproc::circle(
                &mut canvas,
                point(tip),
                10,
                bgr(color),
                5,
                imgproc::LINE_8,
                0,
            )?;
        }
    }

    imgproc::put_text(
        &mut canvas,
        &format!("FPS: {:.0}", fps),
        Point::new(10, 70),
        imgproc::FONT_HERSHEY_PLAIN,
        3.0,
        Scalar::new(255.0, 0.0, 255.0, 0.0),
        3,
        imgproc::LINE_8,
        false,
    )?;

    Ok(canvas)
}
