use dossier_config::Config;
use dossier_files::format_file_size;

pub fn run(config: &Config) {
    let limits = &config.limits;
    let formats: Vec<&str> = limits.allowed_formats.iter().map(|f| f.as_str()).collect();
    println!("Maximum files:          {}", limits.max_files);
    println!("Maximum file size:      {}", format_file_size(limits.max_file_size));
    println!("Maximum selection size: {}", format_file_size(limits.max_total_size));
    println!("Allowed formats:        {}", formats.join(", "));
    println!("Local compression up to {}", format_file_size(config.local.size_threshold));
}
