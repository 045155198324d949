/// Source-over compositing of straight (non-premultiplied) RGBA8 pixels.
pub fn over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u32::from(src[3]);
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let da = mul_div255(u32::from(dst[3]), 255 - sa);
    let out_a = sa + da;

    let mut out = [0u8; 4];
    out[3] = out_a.min(255) as u8;
    for i in 0..3 {
        let premul = u32::from(src[i]) * sa + u32::from(dst[i]) * da;
        out[i] = ((premul + out_a / 2) / out_a).min(255) as u8;
    }
    out
}

fn mul_div255(x: u32, y: u32) -> u32 {
    (x * y + 127) / 255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_source_is_noop() {
        let dst = [10, 20, 30, 40];
        assert_eq!(over(dst, [255, 255, 255, 0]), dst);
    }

    #[test]
    fn opaque_source_replaces() {
        assert_eq!(over([0, 0, 0, 255], [255, 0, 0, 255]), [255, 0, 0, 255]);
    }

    #[test]
    fn half_alpha_over_opaque_mixes() {
        let out = over([0, 0, 0, 255], [255, 255, 255, 136]);
        assert_eq!(out[3], 255);
        assert_eq!(out[0], 136);
    }

    #[test]
    fn over_transparent_keeps_source_color() {
        assert_eq!(over([0, 0, 0, 0], [100, 110, 120, 200]), [100, 110, 120, 200]);
    }
}
