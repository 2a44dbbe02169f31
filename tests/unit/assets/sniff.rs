use super::*;

fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let p = dir.join(name);
    image::RgbImage::from_pixel(w, h, image::Rgb([200, 40, 40]))
        .save_with_format(&p, image::ImageFormat::Png)
        .unwrap();
    p
}

#[test]
fn sniff_uses_content_not_extension() {
    let dir = tempfile::tempdir().unwrap();
    let disguised = write_png(dir.path(), "photo.jpg", 16, 9);

    let asset = sniff_image(3, &disguised).unwrap();
    assert_eq!(asset.kind, ImageKind::Png);
    assert_eq!((asset.width, asset.height), (16, 9));
    assert_eq!(asset.source_index, 3);

    let fake = dir.path().join("fake.png");
    std::fs::write(&fake, b"definitely not an image").unwrap();
    let rejection = sniff_image(0, &fake).unwrap_err();
    assert!(rejection.reason.contains("signature"));
}

#[test]
fn sniff_rejects_empty_missing_and_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.png");
    std::fs::write(&empty, b"").unwrap();
    assert!(sniff_image(0, &empty).unwrap_err().reason.contains("empty"));

    let missing = dir.path().join("missing.png");
    assert!(sniff_image(0, &missing).unwrap_err().reason.contains("cannot read"));

    let gif = dir.path().join("anim.gif");
    std::fs::write(&gif, b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").unwrap();
    assert!(sniff_image(0, &gif).unwrap_err().reason.contains("unsupported"));
}

#[test]
fn sniff_rejects_truncated_png() {
    let dir = tempfile::tempdir().unwrap();
    let truncated = dir.path().join("cut.png");
    std::fs::write(&truncated, b"\x89PNG\r\n\x1a\n\x00\x00").unwrap();
    assert!(sniff_image(0, &truncated).is_err());
}

#[test]
fn validate_keeps_order_and_collects_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_png(dir.path(), "a.png", 8, 8);
    let bad = dir.path().join("bad.webp");
    std::fs::write(&bad, b"RIFF").unwrap();
    let c = write_png(dir.path(), "c.png", 8, 4);

    let out = validate_assets(&[a.clone(), bad.clone(), c.clone()]).unwrap();
    let paths: Vec<_> = out.assets.iter().map(|x| x.path.clone()).collect();
    assert_eq!(paths, vec![a, c]);
    assert_eq!(out.assets[1].source_index, 2);
    assert_eq!(out.rejected.len(), 1);
    assert_eq!(out.rejected[0].path, bad);
    assert!(matches!(
        out.rejected[0].to_error(),
        ReelError::AssetRejected { .. }
    ));
}

#[test]
fn validate_with_nothing_usable_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"nope").unwrap();
    assert!(matches!(
        validate_assets(&[bad]).unwrap_err(),
        ReelError::NoUsableAssets
    ));
    assert!(matches!(
        validate_assets(&[]).unwrap_err(),
        ReelError::NoUsableAssets
    ));
}
