#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("layout_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use enchartix_engine::chart::camera::{flat_dims, orbit_dims};
    use enchartix_engine::chart::{
        LayoutEngine, LayoutParams, Rgb, SceneFraming, Series, ThemeStyle, parse_series_json,
    };
    use enchartix_engine::geom::GeomMesh;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"layout_cli (enchartix-engine)

USAGE:
  layout_cli list
  layout_cli run <demo|path.json> [options]

DEMOS:
  fitness
  study

OPTIONS (run):
  --width <w>        Box width (default: 3D width)
  --depth <d>        Box depth (default: 120 per series)
  --flat             Use the flat-view box for the given --aspect
  --aspect <a>       Viewport aspect ratio for --flat (default 2)
  --theme <hex>      Theme color (default #7d33ff)
  --light            Light palette instead of dark
  --obj <path>       Write tubes and segment volumes as OBJ
  --overwrite        Overwrite an existing OBJ file
  -h, --help         Show this help
"#;

    const DEMOS: &[(&str, &str)] = &[
        ("fitness", include_str!("../../demos/fitness.json")),
        ("study", include_str!("../../demos/study.json")),
    ];

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                for (name, _) in DEMOS {
                    println!("{name}");
                }
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let source = args.next().ok_or("missing demo name or data file")?;

        let mut width: Option<f64> = None;
        let mut depth: Option<f64> = None;
        let mut flat = false;
        let mut aspect = 2.0;
        let mut theme_hex = "#7d33ff".to_string();
        let mut dark = true;
        let mut obj_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--width" => width = Some(args.number("--width")?),
                "--depth" => depth = Some(args.number("--depth")?),
                "--flat" => flat = true,
                "--aspect" => aspect = args.number("--aspect")?,
                "--theme" => theme_hex = args.value("--theme")?,
                "--light" => dark = false,
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let series = load_series(&source)?;
        let theme = Rgb::from_hex(&theme_hex).map_err(|e| e.to_string())?;
        let style = ThemeStyle::derive(theme, dark);

        let orbit = orbit_dims(series.len());
        let mut engine = LayoutEngine::build(&series, theme, style, orbit, false);
        let framing = SceneFraming::from_bounds(engine.bounds());

        let base = if flat {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(format!("--aspect must be > 0, got {aspect}"));
            }
            flat_dims(framing.view_size, aspect)
        } else {
            orbit
        };
        let params = LayoutParams::new(
            width.unwrap_or(base.box_width),
            depth.unwrap_or(base.box_depth),
        );
        if !(params.box_width > 0.0 && params.box_depth > 0.0) {
            return Err("box width and depth must be > 0".to_string());
        }
        if params != orbit {
            engine.apply_layout(params, true);
        }

        print_summary(&engine, &framing);

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &engine, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        Ok(())
    }

    fn load_series(source: &str) -> Result<Vec<Series>, String> {
        let text = match DEMOS.iter().find(|(name, _)| *name == source) {
            Some((_, json)) => (*json).to_string(),
            None => {
                let path = Path::new(source);
                if !path.exists() {
                    let names: Vec<&str> = DEMOS.iter().map(|(name, _)| *name).collect();
                    return Err(format!(
                        "`{source}` is neither a demo ({}) nor an existing file",
                        names.join(", ")
                    ));
                }
                fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?
            }
        };
        parse_series_json(&text).map_err(|e| e.to_string())
    }

    fn print_summary(engine: &LayoutEngine, framing: &SceneFraming) {
        let params = engine.params();
        println!(
            "box {:.2} x {:.2}, framing max dim {:.2}, view size {:.2}",
            params.box_width, params.box_depth, framing.max_dim, framing.view_size
        );

        for record in engine.records() {
            let (vertices, triangles) = record
                .tube
                .as_ref()
                .map_or((0, 0), |t| (t.vertex_count(), t.triangle_count()));
            println!(
                "{} [{}]: points={} segments={} tube vertices={} triangles={} max cumulative={}",
                record.name,
                record.accent.to_hex(),
                record.positions.len(),
                record.segments.len(),
                vertices,
                triangles,
                record.derived.stats.max_cumulative
            );
            for segment in &record.segments {
                let c = segment.center();
                let s = segment.size();
                println!(
                    "  {:<28} center=({:.2}, {:.2}, {:.2}) size=({:.2}, {:.2}, {:.2}) total={}",
                    segment.meta.date, c.x, c.y, c.z, s.x, s.y, s.z, segment.meta.running_total
                );
            }
        }

        if let Some(bounds) = engine.bounds() {
            println!(
                "bounds min=({:.2}, {:.2}, {:.2}) max=({:.2}, {:.2}, {:.2})",
                bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
            );
        }
        let stats = engine.stats();
        eprintln!(
            "layout passes={} rebuilds={} skipped tubes={}",
            stats.passes, stats.rebuild_passes, stats.skipped_tubes
        );
    }

    fn write_obj_file(path: &Path, engine: &LayoutEngine, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# enchartix-engine layout_cli").map_err(|e| format!("write obj: {e}"))?;

        let mut offset = 0u32;
        for (series_idx, record) in engine.records().iter().enumerate() {
            if let Some(tube) = record.tube.as_ref() {
                write_object(&mut w, &format!("series{series_idx}_tube"), tube, &mut offset)?;
            }
            for (segment_idx, segment) in record.segments.iter().enumerate() {
                let placed = segment.mesh.translated(segment.center().to_vec3());
                write_object(
                    &mut w,
                    &format!("series{series_idx}_segment{segment_idx}"),
                    &placed,
                    &mut offset,
                )?;
            }
        }

        w.flush().map_err(|e| format!("flush obj: {e}"))
    }

    fn write_object<W: Write>(
        w: &mut W,
        name: &str,
        mesh: &GeomMesh,
        offset: &mut u32,
    ) -> Result<(), String> {
        if mesh.has_invalid_vertices() || !mesh.has_valid_indices() {
            return Err(format!("mesh `{name}` failed validation"));
        }

        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;
        for (p, c) in mesh.positions.iter().zip(&mesh.colors) {
            writeln!(w, "v {} {} {} {} {} {}", p[0], p[1], p[2], c[0], c[1], c[2])
                .map_err(|e| format!("write obj: {e}"))?;
        }
        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1 + *offset;
            let b = tri[1] + 1 + *offset;
            let c = tri[2] + 1 + *offset;
            writeln!(w, "f {a} {b} {c}").map_err(|e| format!("write obj: {e}"))?;
        }
        *offset += mesh.vertex_count() as u32;
        Ok(())
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }

        fn number(&mut self, flag: &str) -> Result<f64, String> {
            let raw = self.value(flag)?;
            raw.parse::<f64>()
                .map_err(|_| format!("{flag} expects a number, got `{raw}`"))
        }
    }
}
