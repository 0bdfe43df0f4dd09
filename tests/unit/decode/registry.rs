use super::*;
use crate::pixel::format::ColorFormat;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Scripted {
    name: &'static str,
    recognize: bool,
    fail_open: bool,
    width: u16,
    opens: Arc<AtomicUsize>,
}

impl ImageDecoder for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn info(&self, _src: &ImageSource) -> BlitResult<ImageHeader> {
        if !self.recognize {
            return Err(BlitError::no_decoder("nope"));
        }
        Ok(ImageHeader {
            color_format: ColorFormat::Rgba8888,
            width: self.width,
            height: 1,
            stride: u32::from(self.width) * 4,
        })
    }

    fn open(&self, session: &mut DecoderSession) -> BlitResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            // Leave junk behind to prove the next decoder gets a clean session.
            session.error_msg = Some(self.name.to_owned());
            session.user_data = Some(Box::new(7u32));
            return Err(BlitError::decode_open("corrupt"));
        }
        Ok(())
    }

    fn read_line(
        &self,
        _session: &mut DecoderSession,
        _x: u32,
        _y: u32,
        len: u32,
        out: &mut [u8],
    ) -> BlitResult<()> {
        out[..len as usize * 4].fill(9);
        Ok(())
    }
}

fn scripted(
    name: &'static str,
    recognize: bool,
    fail_open: bool,
) -> (Scripted, Arc<AtomicUsize>) {
    let opens = Arc::new(AtomicUsize::new(0));
    (
        Scripted {
            name,
            recognize,
            fail_open,
            width: 2,
            opens: opens.clone(),
        },
        opens,
    )
}

#[test]
fn empty_registry_reports_no_decoder() {
    let r = DecoderRegistry::new();
    let err = r.open(&ImageSource::symbol("x"), Rgba8::WHITE, 0).unwrap_err();
    assert!(matches!(err, BlitError::NoDecoder(_)));
    assert!(matches!(r.get_info(&ImageSource::symbol("x")), Err(BlitError::NoDecoder(_))));
}

#[test]
fn first_registered_decoder_wins() {
    let mut r = DecoderRegistry::new();
    let (a, a_opens) = scripted("a", true, false);
    let (b, b_opens) = scripted("b", true, false);
    let a_id = r.register(a);
    r.register(b);
    let s = r.open(&ImageSource::symbol("x"), Rgba8::WHITE, 0).unwrap();
    assert_eq!(s.decoder, Some(a_id));
    assert_eq!(a_opens.load(Ordering::SeqCst), 1);
    assert_eq!(b_opens.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_decoder_does_not_leak_state_into_the_next() {
    let mut r = DecoderRegistry::new();
    let (bad, _) = scripted("bad", true, true);
    let (skip, skip_opens) = scripted("skip", false, false);
    let (good, _) = scripted("good", true, false);
    r.register(bad);
    r.register(skip);
    let good_id = r.register(good);

    let s = r.open(&ImageSource::symbol("x"), Rgba8::WHITE, 0).unwrap();
    assert_eq!(s.decoder, Some(good_id));
    assert!(s.error_msg.is_none());
    assert!(s.user_data.is_none());
    assert_eq!(skip_opens.load(Ordering::SeqCst), 0);
}

#[test]
fn every_recognizer_failing_is_open_failed() {
    let mut r = DecoderRegistry::new();
    let (bad, _) = scripted("bad", true, true);
    r.register(bad);
    let err = r.open(&ImageSource::symbol("x"), Rgba8::WHITE, 0).unwrap_err();
    assert!(matches!(err, BlitError::DecodeOpenFailed(ref m) if m.contains("bad")));
}

#[test]
fn read_line_is_routed_and_bounds_checked() {
    let mut r = DecoderRegistry::new();
    let (a, _) = scripted("a", true, false);
    r.register(a);
    let mut s = r.open(&ImageSource::symbol("x"), Rgba8::WHITE, 0).unwrap();
    s.user_data = Some(Box::new(1u8));
    let mut row = [0u8; 8];
    r.read_line(&mut s, 0, 0, 2, &mut row).unwrap();
    assert_eq!(row, [9; 8]);
    assert!(r.read_line(&mut s, 1, 0, 2, &mut row).is_err());
    assert!(r.read_line(&mut s, 0, 1, 1, &mut row).is_err());
    assert!(r.read_line(&mut s, u32::MAX, 0, 2, &mut row).is_err());

    r.close(&mut s);
    assert!(s.user_data.is_none());
    assert!(matches!(
        r.read_line(&mut s, 0, 0, 1, &mut row),
        Err(BlitError::ReadLineFailed(_))
    ));
}

#[test]
fn decoded_sessions_reject_read_line() {
    let r = DecoderRegistry::with_builtin();
    let src = ImageSource::memory(PixelBuffer::filled_rgba(2, 2, Rgba8::WHITE));
    let mut s = r.open(&src, Rgba8::WHITE, 0).unwrap();
    assert!(!s.needs_read_line());
    let mut row = [0u8; 8];
    assert!(r.read_line(&mut s, 0, 0, 2, &mut row).is_err());
}

#[test]
fn empty_headers_are_rejected_before_open() {
    let mut r = DecoderRegistry::new();
    let (mut empty, opens) = scripted("empty", true, false);
    empty.width = 0;
    r.register(empty);
    let src = ImageSource::symbol("x");
    assert!(matches!(r.get_info(&src), Err(BlitError::DecodeOpenFailed(_))));
    let err = r.open(&src, Rgba8::WHITE, 0).unwrap_err();
    assert!(matches!(err, BlitError::DecodeOpenFailed(ref m) if m.contains("empty")));
    assert_eq!(opens.load(Ordering::SeqCst), 0);

    let (good, _) = scripted("good", true, false);
    let good_id = r.register(good);
    assert_eq!(r.open(&src, Rgba8::WHITE, 0).unwrap().decoder, Some(good_id));
}
