use console::Style;
use revive_core::job::{EnhancementJob, StageSelection};
use revive_core::pipeline::config::EnhanceConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_job_summary(job: &EnhancementJob, config: &EnhanceConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Revive"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(6)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(job.source().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output dir"),
        s.path.apply_to(config.output_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Format"),
        s.value.apply_to(job.format())
    );
    println!();

    let upscales = job.selection() == StageSelection::UpscaleOnly;
    if upscales {
        println!("  {}", s.header.apply_to("Upscale"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Model"),
            s.method.apply_to(job.upscale_model())
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Scale"),
            s.value.apply_to(format!("x{}", job.upscale_scale()))
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Tool"),
            s.path.apply_to(config.tool.display())
        );
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Upscale"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();

    if job.runs_restore() {
        let params = job.restore_params();
        println!("  {}", s.header.apply_to("Face Restore"));
        println!(
            "    {:<12}{}",
            s.label.apply_to("Model"),
            s.method.apply_to(params.model)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Arch"),
            s.value.apply_to(params.arch)
        );
        println!(
            "    {:<12}{}",
            s.label.apply_to("Upscale"),
            s.value.apply_to(format!("x{}", job.scale()))
        );
        if params.aligned {
            println!("    {:<12}{}", s.label.apply_to("Faces"), s.value.apply_to("aligned"));
        }
        if params.only_center_face {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Faces"),
                s.value.apply_to("centre only")
            );
        }
        if upscales {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Input"),
                s.disabled.apply_to("upscale output")
            );
        }
    } else {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Face Restore"),
            s.disabled.apply_to("disabled")
        );
    }
    println!();
}
