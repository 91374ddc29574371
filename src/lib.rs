//! Convert Les Houches Event files into tables of top quark kinematics
//! and spin correlation observables.
//!
//! Each event is read with a [Reader], its particles are classified by
//! their role in the ttbar decay chain, the top quarks are taken from the
//! record or reconstructed from their decay products, and the result is
//! written as one row of a tab-separated table.
//!
//! # Example
//!
//! ```rust,no_run
//! let config = lhespin::Config {
//!     input: "events.lhe".into(),
//!     ..Default::default()
//! };
//! let summary = lhespin::run(&config).unwrap();
//! println!("{} of {} events written", summary.written, summary.events);
//! ```
pub mod classify;
pub mod data;
pub mod kinematics;
pub mod observables;
pub mod pipeline;
pub mod reader;
pub mod reconstruct;
pub mod row;
pub mod status;
pub mod writer;
mod tags;

pub use data::*;
pub use pipeline::{convert, run, Config, RunSummary};
pub use reader::{EventParseError, ReadError, Reader, XmlTree};
pub use writer::{WriteError, Writer};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::{lhef, TTBAR_ONSHELL};
    use std::io;

    const DILEPTON_WITH_REWEIGHTS: &str = " 8 1 +3.0e+00 1.725e+02 7.5e-03 1.1e-01
       21 -1    0    0  501  502 0.0 0.0 +2.0e+02 2.0e+02 0.0 0.0 1.0
       21 -1    0    0  502  501 0.0 0.0 -2.0e+02 2.0e+02 0.0 0.0 -1.0
      -13  1    1    2    0    0 +3.0e+01 0.0 +4.0e+01 5.0e+01 0.0 0.0 1.0
       14  1    1    2    0    0 0.0 0.0 -4.0e+01 4.0e+01 0.0 0.0 -1.0
        5  1    1    2  501    0 +9.0e+01 0.0 0.0 1.1e+02 6.3245553203367585e+01 0.0 1.0
       11  1    1    2    0    0 -3.0e+01 0.0 -4.0e+01 5.0e+01 0.0 0.0 -1.0
      -12  1    1    2    0    0 0.0 0.0 +4.0e+01 4.0e+01 0.0 0.0 1.0
       -5  1    1    2    0  501 -9.0e+01 0.0 0.0 1.1e+02 6.3245553203367585e+01 0.0 -1.0
<rwgt>
<wgt id='mt_up'> 2.9e+00 </wgt>
<wgt id='mt_down'> 3.1e+00 </wgt>
</rwgt>
";

    fn table(input: &[u8]) -> Vec<Vec<String>> {
        let mut reader = Reader::new(io::Cursor::new(input)).unwrap();
        let mut writer = Writer::new(Vec::new(), "ttbar").unwrap();
        convert(&mut reader, &mut writer).unwrap();
        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        output
            .lines()
            .skip(1)
            .map(|l| l.split('\t').map(str::to_owned).collect())
            .collect()
    }

    #[test]
    fn end_to_end() {
        let text = lhef(&[DILEPTON_WITH_REWEIGHTS, TTBAR_ONSHELL]);
        let rows = table(text.as_bytes());
        assert_eq!(rows.len(), 3);
        let header = &rows[0];
        let get = |row: usize, name: &str| {
            let pos = header.iter().position(|n| n == name).unwrap();
            rows[row][pos].as_str()
        };
        assert_eq!(get(1, "rwgt_mt_up"), "2.9");
        assert_eq!(get(2, "rwgt_mt_down"), "");
        assert_eq!(get(1, "onshell_top"), "0");
        assert_eq!(get(2, "onshell_top"), "1");
        assert_eq!(get(1, "lp_pdgid"), "-13");
        assert_eq!(get(1, "lm_pdgid"), "11");
        assert_eq!(get(2, "lp_pdgid"), "");
        assert_eq!(get(1, "init_x_1"), (200f64 / 6500.).to_string());
        assert_eq!(get(2, "ttbar_y"), "0.0");
        assert_eq!(get(2, "top_m"), "172.5");
        assert_eq!(get(2, "cosp_raxis"), "");
        let cos_r: f64 = get(1, "cosp_raxis").parse().unwrap();
        assert!((cos_r - 1.).abs() < 1e-12);
        let cos_phi: f64 = get(1, "cos_phi").parse().unwrap();
        assert!((cos_phi + 1.).abs() < 1e-12);
    }
}
