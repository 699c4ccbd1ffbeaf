//! HTML pages. Every view takes plain data and returns a complete document;
//! all interpolated text goes through [`escape`].

use std::fmt::Write;

use crate::database::{AppointmentDetails, Client, Dentist, Treatment};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <nav><a href=\"/\">Dentists</a> | <a href=\"/schedule\">Schedule</a> | \
         <a href=\"/add-appointment\">New appointment</a> | \
         <a href=\"/add-client\">New client</a> | \
         <a href=\"/add-treatment\">New treatment</a> | \
         <a href=\"/add-dentist\">New dentist</a></nav>\n\
         <h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn options<T>(items: &[T], value: impl Fn(&T) -> i64, label: impl Fn(&T) -> &str) -> String {
    items.iter().fold(String::new(), |mut out, item| {
        let _ = writeln!(
            out,
            "<option value=\"{}\">{}</option>",
            value(item),
            escape(label(item))
        );
        out
    })
}

pub fn index(dentists: &[Dentist]) -> String {
    let mut body = String::from("<ul>\n");
    for d in dentists {
        let _ = writeln!(
            body,
            "<li><a href=\"/dentist/{}\">{}</a> ({})</li>",
            d.id,
            escape(&d.name),
            escape(&d.specialty)
        );
    }
    body.push_str("</ul>");
    layout("Our Dentists", &body)
}

pub fn dentist_details(dentist: &Dentist) -> String {
    let body = format!(
        "<img src=\"/{image}\" alt=\"{name}\">\n\
         <p>Specialty: {specialty}</p>\n\
         <p><a href=\"/schedule/{id}\">Schedule an appointment</a></p>\n\
         <h2>Edit</h2>\n\
         <form method=\"post\" action=\"/dentist/{id}/edit\">\n\
         <input name=\"name\" value=\"{name}\">\n\
         <input name=\"specialty\" value=\"{specialty}\">\n\
         <input name=\"image\" value=\"{image}\">\n\
         <button type=\"submit\">Save</button>\n</form>\n\
         <form method=\"post\" action=\"/dentist/{id}/delete\">\n\
         <button type=\"submit\">Delete</button>\n</form>",
        id = dentist.id,
        name = escape(&dentist.name),
        specialty = escape(&dentist.specialty),
        image = escape(&dentist.image),
    );
    layout(&dentist.name, &body)
}

pub fn schedule_appointment(dentist: &Dentist, treatments: &[Treatment]) -> String {
    let body = format!(
        "<form method=\"post\" action=\"/schedule/{id}\">\n\
         <label>Patient name <input name=\"patientName\"></label>\n\
         <label>Treatment <select name=\"treatmentId\">\n\
         <option value=\"\">Not decided</option>\n{treatments}</select></label>\n\
         <label>Date <input type=\"date\" name=\"date\"></label>\n\
         <label>Time <input name=\"time\"></label>\n\
         <button type=\"submit\">Schedule</button>\n</form>",
        id = dentist.id,
        treatments = options(treatments, |t| t.id, |t| t.name.as_str()),
    );
    layout(&format!("Schedule with {}", dentist.name), &body)
}

pub fn add_treatment() -> String {
    layout(
        "Add Treatment",
        "<form method=\"post\" action=\"/add-treatment\">\n\
         <label>Name <input name=\"name\"></label>\n\
         <label>Description <textarea name=\"description\"></textarea></label>\n\
         <button type=\"submit\">Add</button>\n</form>",
    )
}

pub fn add_client() -> String {
    layout(
        "Add Client",
        "<form method=\"post\" action=\"/add-client\">\n\
         <label>Name <input name=\"name\"></label>\n\
         <label>Email <input type=\"email\" name=\"email\"></label>\n\
         <button type=\"submit\">Add</button>\n</form>",
    )
}

pub fn add_dentist() -> String {
    layout(
        "Add Dentist",
        "<form method=\"post\" action=\"/add-dentist\">\n\
         <label>Name <input name=\"name\"></label>\n\
         <label>Specialty <input name=\"specialty\"></label>\n\
         <label>Image <input name=\"image\"></label>\n\
         <button type=\"submit\">Add</button>\n</form>",
    )
}

pub fn add_appointment(
    dentists: &[Dentist],
    clients: &[Client],
    treatments: &[Treatment],
) -> String {
    let body = format!(
        "<form method=\"post\" action=\"/add-appointment\">\n\
         <label>Dentist <select name=\"dentistId\">\n{dentists}</select></label>\n\
         <label>Client <select name=\"clientId\">\n{clients}</select></label>\n\
         <label>Treatment <select name=\"treatmentId\">\n{treatments}</select></label>\n\
         <label>Date <input type=\"date\" name=\"date\"></label>\n\
         <label>Time <input name=\"time\"></label>\n\
         <button type=\"submit\">Add</button>\n</form>",
        dentists = options(dentists, |d| d.id, |d| d.name.as_str()),
        clients = options(clients, |c| c.id, |c| c.name.as_str()),
        treatments = options(treatments, |t| t.id, |t| t.name.as_str()),
    );
    layout("Add Appointment", &body)
}

pub fn appointment_schedule(appointments: &[AppointmentDetails]) -> String {
    let mut body = String::from(
        "<table>\n<tr><th>#</th><th>Dentist</th><th>Client</th>\
         <th>Treatment</th><th>Date</th><th>Time</th></tr>\n",
    );
    for a in appointments {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            a.id,
            escape(&a.dentist_name),
            escape(&a.client_name),
            escape(&a.treatment_name),
            escape(&a.date),
            escape(&a.time)
        );
    }
    body.push_str("</table>");
    layout("Appointment Schedule", &body)
}
