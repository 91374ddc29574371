use std::io::BufReader;

use criterion::{criterion_group, criterion_main, Criterion};
use lhespin::{convert, Reader, Writer};

const NEVENTS: usize = 2000;

const INIT: &str = "<init>
2212 2212 6.500000e+03 6.500000e+03 0 0 247000 247000 -4 1
5.000000e+02 1.000000e+00 5.000000e+02 1
</init>
";

// dileptonic ttbar event, rotated around the beam axis by `phi`
fn dilepton(phi: f64) -> String {
    let (c, s) = (phi.cos(), phi.sin());
    let mut event = String::from(" 8 1 +3.0e+00 1.725e+02 7.5e-03 1.1e-01\n");
    let particles = [
        (21, -1, [0., 0., 200., 200.], 0.),
        (21, -1, [0., 0., -200., 200.], 0.),
        (-11, 1, [30., 0., 40., 50.], 0.),
        (12, 1, [0., 0., -40., 40.], 0.),
        (5, 1, [90., 0., 0., 110.], 4000f64.sqrt()),
        (13, 1, [-30., 0., -40., 50.], 0.),
        (-14, 1, [0., 0., 40., 40.], 0.),
        (-5, 1, [-90., 0., 0., 110.], 4000f64.sqrt()),
    ];
    for (id, status, [px, py, pz, e], m) in particles {
        let (px, py) = (c * px - s * py, s * px + c * py);
        event.push_str(&format!(
            "{id} {status} 1 2 0 0 {px:e} {py:e} {pz:e} {e:e} {m:e} 0.0 1.0\n"
        ));
    }
    event
}

fn lhef() -> Vec<u8> {
    let mut text = String::from("<LesHouchesEvents version=\"3.0\">\n");
    text.push_str(INIT);
    for n in 0..NEVENTS {
        text.push_str("<event>\n");
        text.push_str(&dilepton(n as f64 * 0.01));
        text.push_str("</event>\n");
    }
    text.push_str("</LesHouchesEvents>\n");
    text.into_bytes()
}

fn criterion_benchmark(c: &mut Criterion) {
    let event_txt = lhef();
    c.bench_function("read", |b| {
        b.iter(|| {
            let reader = BufReader::new(event_txt.as_slice());
            let mut lhef = Reader::new(reader).unwrap();
            let mut nevents = 0;
            while let Ok(Some(_)) = lhef.event() {
                nevents += 1
            }
            assert_eq!(nevents, NEVENTS);
        })
    });

    c.bench_function("convert", |b| {
        b.iter(|| {
            let reader = BufReader::new(event_txt.as_slice());
            let mut lhef = Reader::new(reader).unwrap();
            let mut writer = Writer::new(std::io::sink(), "bench").unwrap();
            let summary = convert(&mut lhef, &mut writer).unwrap();
            assert_eq!(summary.written, NEVENTS);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
