//! Generate a deterministic sample condensado for demos and manual testing.

use condensado::data::model::{COL_DATE, COL_EXPORTER, COL_PRODUCT};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);

    let products = [
        ("Pasta corta / 500 g", 0.42),
        ("Pasta larga / 1 kg", 0.78),
        ("Pasta integral / 500 g", 0.55),
        ("Harina 00 / 25 kg", 14.20),
    ];
    let exporters = ["Molino Rossi SpA", "Italgrani SRL", "Pastificio Bravo"];

    let output_path = "condensado_sample.csv";
    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record([
        COL_DATE,
        COL_PRODUCT,
        COL_EXPORTER,
        "Factura",
        "Precio compra EUROS",
        "Costo pieza mxn",
        "Flete Maritimo ($/pieza)",
        "COSTO DE IMPORTACION X PIEZA ($/pieza)",
        "TIPO DE CAMBIO",
        "DÓLAR (DOF)",
    ])?;

    let mut rows = 0usize;
    let mut invoice = 1000u32;
    for year in [2023, 2024] {
        // Costs drift upward year over year.
        let drift = if year == 2023 { 1.0 } else { 1.12 };
        for month in 1..=12 {
            for (product, base_eur) in &products {
                for exporter in &exporters {
                    // Not every exporter ships every product every month.
                    if rng.next_f64() < 0.35 {
                        continue;
                    }
                    let day = 1 + (rng.next_u64() % 28) as u32;
                    let eur = base_eur * drift * (1.0 + rng.gauss(0.0, 0.04));
                    let fx = rng.gauss(if year == 2023 { 17.3 } else { 18.6 }, 0.35);
                    let dof = fx + rng.gauss(0.0, 0.05);
                    let mxn = eur * fx * 1.08;
                    let freight = 0.06 * drift * (1.0 + rng.gauss(0.0, 0.10));
                    let landed = mxn + (freight + 0.04) * fx;

                    // Occasional blank cell, as in real condensados.
                    let freight_cell = if rng.next_f64() < 0.05 {
                        String::new()
                    } else {
                        format!("{freight:.4}")
                    };

                    invoice += 1;
                    writer.write_record([
                        format!("{year}-{month:02}-{day:02}"),
                        product.to_string(),
                        exporter.to_string(),
                        format!("F-{invoice}"),
                        format!("{eur:.4}"),
                        format!("{mxn:.4}"),
                        freight_cell,
                        format!("{landed:.4}"),
                        format!("{fx:.4}"),
                        format!("{dof:.4}"),
                    ])?;
                    rows += 1;
                }
            }
        }
    }
    writer.flush()?;

    println!("Wrote {rows} records for 2023–2024 to {output_path}");
    Ok(())
}
