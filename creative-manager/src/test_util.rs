use std::io::Cursor;

use gateway::{
    dummy::{Dummy, Options},
    GeneratedCopy,
};
use image::{ImageFormat, Rgb, RgbImage};
use primitives::{test_util::DUMMY_IDENTITY, CallToAction};

/// A real, decodable PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 94, 20]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Should encode the PNG");

    bytes
}

pub fn dummy_copy() -> GeneratedCopy {
    GeneratedCopy {
        primary_text: "Warm up your wardrobe, everything is 30% off this weekend.".into(),
        headline: "The Fall Sale is here".into(),
        description: "Ends Sunday".into(),
        call_to_action: Some(CallToAction::ShopNow),
    }
}

pub fn dummy_gateway() -> Dummy {
    Dummy::init(Options {
        dummy_identity: DUMMY_IDENTITY.clone(),
        dummy_copy: dummy_copy(),
        dummy_base_url: "https://dummy.gateway/".parse().expect("Valid url"),
    })
}
