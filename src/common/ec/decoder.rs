use super::galois::G;
use super::{Block, MAX_BLOCK_SIZE, MAX_EC_SIZE};
use crate::common::error::{QRError, QRResult};

// Rectifier
//------------------------------------------------------------------------------

impl Block {
    /// Corrects in-place up to `ec_len / 2` corrupted codewords and returns
    /// the repaired data codewords.
    pub fn rectify(&mut self) -> QRResult<&[u8]> {
        // Compute syndromes
        let synd = match self.syndromes() {
            Ok(()) => return Ok(self.data()),
            Err(s) => s,
        };

        // Error locator polynomial
        let sig = self.berlekamp_massey(&synd);
        let err_loc = self.chien_search(&sig);

        // Formal derivative of sigma; even terms vanish in characteristic 2
        let mut dsig = [G(0); MAX_EC_SIZE];
        for i in (1..MAX_EC_SIZE).step_by(2) {
            dsig[i - 1] = sig[i];
        }

        // Error evaluator
        let omg = self.omega(&synd, &sig);

        // Error magnitude
        let err_mag = self.forney(&omg, &dsig, &err_loc);

        // Rectify errors by XORing data with magnitude
        for (i, &g) in err_mag.iter().take(self.len).enumerate() {
            self.data[i] = (G(self.data[i]) + g).into();
        }

        match self.syndromes() {
            Ok(()) => Ok(self.data()),
            Err(_) => Err(QRError::TooManyErrors),
        }
    }

    fn syndromes(&self) -> Result<(), [G; MAX_EC_SIZE]> {
        let ec_len = self.ec_len();
        let mut synd = [G(0); MAX_EC_SIZE];

        let mut gdata = [G(0); MAX_BLOCK_SIZE];
        for (g, &b) in gdata.iter_mut().zip(self.data.iter().take(self.len)) {
            *g = G(b);
        }
        for (i, s) in synd.iter_mut().take(ec_len).enumerate() {
            *s = eval_poly(gdata.iter().take(self.len).rev(), G::gen_pow(i));
        }

        if synd.iter().all(|&s| s == G(0)) {
            Ok(())
        } else {
            Err(synd)
        }
    }

    // Sigma polynomial, lowest degree first
    fn berlekamp_massey(&self, synd: &[G]) -> [G; MAX_EC_SIZE] {
        let mut l = 0usize;
        let mut m = 1usize;
        let mut b = G(1);
        let mut cx = [G(0); MAX_EC_SIZE];
        let mut bx = [G(0); MAX_EC_SIZE];
        let mut tx = [G(0); MAX_EC_SIZE];
        cx[0] = G(1);
        bx[0] = G(1);
        let deg = self.ec_len();

        for n in 0..deg {
            // Discrepancy between predicted and observed syndrome
            let mut d = synd[n];
            for i in 1..=l {
                d += cx[i] * synd[n - i];
            }

            if d == G(0) {
                m += 1;
                continue;
            }

            tx.copy_from_slice(&cx);
            let scale = d / b;
            for i in 0..MAX_EC_SIZE - m {
                cx[i + m] += scale * bx[i];
            }

            if 2 * l <= n {
                bx.copy_from_slice(&tx);
                l = n + 1 - l;
                b = d;
                m = 1;
            } else {
                m += 1;
            }
        }
        cx
    }

    // Flags, per codeword position, whether sigma vanishes there
    fn chien_search(&self, sig: &[G; MAX_EC_SIZE]) -> [bool; MAX_BLOCK_SIZE] {
        let deg = self.ec_len();
        let mut err_loc = [false; MAX_BLOCK_SIZE];
        for (i, e) in err_loc[..self.len].iter_mut().rev().enumerate() {
            *e = eval_poly(sig.iter().take(deg), G::gen_pow(255 - i % 255)) == G(0);
        }
        err_loc
    }

    // Error evaluator polynomial
    fn omega(&self, synd: &[G; MAX_EC_SIZE], sig: &[G; MAX_EC_SIZE]) -> [G; MAX_EC_SIZE] {
        let t = self.ec_len() - 1;
        let mut omg = [G(0); MAX_EC_SIZE];
        for i in 0..t {
            let sy = synd[i + 1];
            for j in 0..t - i {
                omg[i + j] += sy * sig[j];
            }
        }
        omg
    }

    fn forney(
        &self,
        omg: &[G; MAX_EC_SIZE],
        dsig: &[G; MAX_EC_SIZE],
        err_loc: &[bool; MAX_BLOCK_SIZE],
    ) -> [G; MAX_BLOCK_SIZE] {
        let mut mag = [G(0); MAX_BLOCK_SIZE];
        for (i, &is_err) in err_loc.iter().take(self.len).rev().enumerate() {
            if !is_err {
                continue;
            }
            let xinv = G::gen_pow(255 - i % 255);
            let omg_x = eval_poly(omg.iter(), xinv);
            let sig_x = eval_poly(dsig.iter(), xinv);
            mag[self.len - 1 - i] = omg_x / sig_x;
        }
        mag
    }
}

fn eval_poly<'a>(poly: impl Iterator<Item = &'a G>, x: G) -> G {
    let mut res = G(0);
    let mut xpow = G(1);
    for &coeff in poly {
        res += coeff * xpow;
        xpow *= x;
    }
    res
}
