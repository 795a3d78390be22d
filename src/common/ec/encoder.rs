use super::galois::G;

// Reed-Solomon encoder
//------------------------------------------------------------------------------

/// Generator polynomial of the given degree with roots α^0..α^(degree-1).
/// Coefficients are highest degree first with the leading 1 omitted.
fn generator_poly(degree: usize) -> Vec<G> {
    let mut poly = vec![G(1)];
    for i in 0..degree {
        let root = G::gen_pow(i);
        let mut next = vec![G(0); poly.len() + 1];
        for (j, &c) in poly.iter().enumerate() {
            next[j] += c;
            next[j + 1] += c * root;
        }
        poly = next;
    }
    poly.remove(0);
    poly
}

/// Error correction codewords for one block: the remainder of polynomial
/// long division of the zero-extended data by the generator polynomial.
pub(crate) fn ecc(block: &[u8], ec_count: usize) -> Vec<u8> {
    let len = block.len();
    let gen_poly = generator_poly(ec_count);

    let mut res = vec![G(0); len + ec_count];
    for (r, &b) in res.iter_mut().zip(block.iter()) {
        *r = G(b);
    }

    for i in 0..len {
        let lead_coeff = res[i];
        if lead_coeff == G(0) {
            continue;
        }
        for (u, &v) in res[i + 1..].iter_mut().zip(gen_poly.iter()) {
            *u += v * lead_coeff;
        }
    }

    res[len..].iter().map(|&g| g.into()).collect()
}

#[cfg(test)]
mod rs_encoder_tests {
    use super::{ecc, generator_poly, G};

    // Degree 2: (x + 1)(x + α) = x^2 + α^25 x + α
    #[test]
    fn test_generator_poly() {
        assert_eq!(generator_poly(1), [G(1)]);
        assert_eq!(generator_poly(2), [G::gen_pow(25), G::gen_pow(1)]);
        let gen = generator_poly(10);
        assert_eq!(gen.len(), 10);
        // All generators have the constant term α^(0+1+..+degree-1)
        assert_eq!(gen[9], G::gen_pow(45));
    }

    #[test]
    fn test_poly_mod_1() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", 10);
        assert_eq!(&*res, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }

    #[test]
    fn test_poly_mod_2() {
        let res = ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec", 13);
        assert_eq!(&*res, b"\xa8H\x16R\xd96\x9c\x00.\x0f\xb4z\x10");
    }

    #[test]
    fn test_poly_mod_3() {
        let res = ecc(b"CUF\x86W&U\xc2w2\x06\x12\x06g&", 18);
        assert_eq!(&*res, b"\xd5\xc7\x0b-s\xf7\xf1\xdf\xe5\xf8\x9au\x9aoV\xa1o'");
    }

    #[test]
    fn test_ecc_roots() {
        // Data followed by its ecc must evaluate to zero at every generator
        // root
        let data = b"\x40\xd2\x75\x47\x76\x17\x32\x06\x27\x26\x96\xc6\xc6\x96\x70\xec";
        let parity = ecc(data, 10);
        let full: Vec<u8> = data.iter().chain(parity.iter()).copied().collect();
        for i in 0..10 {
            let x = G::gen_pow(i);
            let mut acc = G(0);
            for &b in &full {
                acc = acc * x + G(b);
            }
            assert_eq!(acc, G(0), "root {i}");
        }
    }
}
