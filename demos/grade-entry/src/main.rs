//! Wiring demo for the campus-notify subsystem.
//!
//! Builds one dispatcher, subscribes a student window and a professor
//! window, records a grade and an absence, then walks the student's
//! read/dismiss flow.

use campus_notify::NotificationDispatcher;
use campus_notify_desk::DeskEndpoint;
use std::sync::Arc;
use std::time::Instant;

const STUDENT: &str = "10000001";
const PROFESSOR: &str = "20000001";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    let dispatcher = Arc::new(NotificationDispatcher::new());

    let student_window = DeskEndpoint::new(dispatcher.clone(), STUDENT);
    let professor_window = DeskEndpoint::new(dispatcher.clone(), PROFESSOR);
    let _student_sub = dispatcher.subscribe(student_window.clone());
    let _professor_sub = dispatcher.subscribe(professor_window.clone());

    // The professor records a grade and an absence for the student.
    dispatcher.notify_grade_added(STUDENT, PROFESSOR, "Algorithmique")?;
    dispatcher.notify_absence_recorded(STUDENT, PROFESSOR, "Analyse")?;

    // The vice-dean assigns the professor a new module.
    dispatcher.notify_module_assigned(PROFESSOR, "30000001", "Compilation")?;

    println!("student badge:   {}", student_window.badge());
    println!("professor badge: {}", professor_window.badge());
    for toast in student_window.active_toasts() {
        println!(
            "student toast:   [{}] {}",
            toast.notification.kind, toast.notification.title
        );
    }

    // The student opens the panel and reads the newest entry.
    let entries = student_window.open_panel()?;
    student_window.click_entry(&entries[0].id)?;
    println!(
        "after reading one: badge={} stats={:?}",
        student_window.badge(),
        dispatcher.stats(STUDENT)?
    );

    student_window.mark_all_read()?;
    student_window.tick(Instant::now());
    println!(
        "after mark all:    badge={} stats={:?}",
        student_window.badge(),
        dispatcher.stats(STUDENT)?
    );

    Ok(())
}
