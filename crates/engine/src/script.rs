// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-side script generation.
//!
//! A pure function of (service URL, remote scripts dir, runner). The
//! generated ruby reports every lifecycle transition back to the RPC
//! surface, posts a heartbeat every 90 seconds, skips stages that
//! already finished in an earlier run, and converts any uncaught error
//! into a Failed RPC plus a non-zero exit.

use avian_core::{Case, Runner, Stage, StageKind};
use std::fmt::Write;

/// Interval between Heartbeat RPCs, strictly inside the 2-minute
/// liveness threshold.
const HEARTBEAT_SECONDS: u32 = 90;

/// Generate the ruby script for a runner.
pub fn generate(service_url: &str, remote_scripts_dir: Option<&str>, runner: &Runner) -> String {
    let mut s = String::new();
    header(&mut s, service_url, runner);
    helpers(&mut s);
    heartbeat(&mut s);
    open_cases(&mut s, runner);
    start(&mut s);

    for stage in &runner.stages {
        if stage.is_finished() {
            let _ = writeln!(
                s,
                "puts('Skipping finished stage: {}')",
                rb(&stage.name())
            );
            continue;
        }
        stage_block(&mut s, stage, remote_scripts_dir);
    }

    finish(&mut s);
    s
}

fn header(s: &mut String, service_url: &str, runner: &Runner) {
    let _ = write!(
        s,
        "# Code generated by Avian; DO NOT EDIT.\n\
         require 'net/http'\n\
         require 'uri'\n\
         require 'json'\n\
         require 'thread'\n\
         \n\
         RUNNER = '{name}'\n\
         RUNNER_ID = {id}\n\
         \n\
         begin\n\
         \x20 @url = URI('{url}')\n\
         \x20 @http = Net::HTTP.new(@url.host, @url.port)\n\
         rescue => e\n\
         \x20 STDERR.puts(\"no connection to avian-service : #{{e}}\")\n\
         \x20 exit(false)\n\
         end\n\n",
        name = rb(&runner.name),
        id = runner.meta.id,
        url = rb(service_url),
    );
}

fn helpers(s: &mut String) {
    s.push_str(
        "# post sends a request to the runner-service\n\
         def post(method, body)\n\
         \x20 uri = \"%sRunnerService.%s\" % [@url, method]\n\
         \x20 request = Net::HTTP::Post.new(uri)\n\
         \x20 request.body = body.to_json\n\
         \x20 request['Content-Type'] = 'application/json'\n\
         \x20 @http.request(request)\n\
         rescue => e\n\
         \x20 STDERR.puts(\"failed to call #{method}: #{e}\")\n\
         end\n\
         \n\
         def start_stage(id)\n\
         \x20 post('StartStage', {runner: RUNNER, stageID: id})\n\
         end\n\
         \n\
         def finish_stage(id)\n\
         \x20 post('FinishStage', {runner: RUNNER, stageID: id})\n\
         end\n\
         \n\
         def failed_stage(id)\n\
         \x20 post('FailedStage', {runner: RUNNER, stageID: id})\n\
         end\n\
         \n\
         def log_info(stage_id, stage, message)\n\
         \x20 post('LogInfo', {runner: RUNNER, stage: stage, stageID: stage_id, message: message})\n\
         end\n\
         \n\
         def log_error(stage_id, stage, message, exception)\n\
         \x20 post('LogError', {runner: RUNNER, stage: stage, stageID: stage_id, message: message, exception: exception})\n\
         end\n\n",
    );
}

fn heartbeat(s: &mut String) {
    let _ = write!(
        s,
        "@heartbeat = Thread.new do\n\
         \x20 loop do\n\
         \x20\x20\x20 post('Heartbeat', {{id: RUNNER_ID, runner: RUNNER}})\n\
         \x20\x20\x20 sleep({HEARTBEAT_SECONDS})\n\
         \x20 end\n\
         end\n\n",
    );
}

fn open_cases(s: &mut String, runner: &Runner) {
    s.push_str(
        "@case_factory = $utilities.getCaseFactory\n\
         \n\
         def open_case(settings)\n\
         \x20 puts(\"Opening case in directory: #{settings['directory']}\")\n\
         \x20 @case_factory.open(settings['directory'])\n\
         rescue java.io.IOException\n\
         \x20 begin\n\
         \x20\x20\x20 puts(\"Creating case in directory: #{settings['directory']}\")\n\
         \x20\x20\x20 @case_factory.create(settings['directory'], settings)\n\
         \x20 rescue java.io.IOException => exception\n\
         \x20\x20\x20 STDERR.puts(\"problem creating new case, case might already be open: #{exception}\")\n\
         \x20\x20\x20 exit(false)\n\
         \x20 end\n\
         end\n\
         \n\
         # tear down the cases; runs at most once, also on the failure paths\n\
         def tear_down(single_case, compound_case, review_compound)\n\
         \x20 return if @torn_down\n\
         \x20 @torn_down = true\n\
         \x20 begin\n\
         \x20\x20\x20 puts('Starting case tear-down')\n\
         \x20\x20\x20 unless compound_case.nil?\n\
         \x20\x20\x20\x20\x20 compound_case.add_child_case(single_case)\n\
         \x20\x20\x20\x20\x20 compound_case.close()\n\
         \x20\x20\x20 end\n\
         \x20\x20\x20 unless review_compound.nil?\n\
         \x20\x20\x20\x20\x20 review_compound.add_child_case(single_case)\n\
         \x20\x20\x20\x20\x20 review_compound.close()\n\
         \x20\x20\x20 end\n\
         \x20\x20\x20 single_case.close() unless single_case.nil?\n\
         \x20 rescue => e\n\
         \x20\x20\x20 STDERR.puts(\"Failed to tear-down cases: #{e}\")\n\
         \x20 end\n\
         end\n\n",
    );

    let _ = writeln!(s, "begin");
    s.push_str(
        "single_case = nil\n\
         compound_case = nil\n\
         review_compound = nil\n",
    );
    if let Some(single) = &runner.case_settings.single {
        case_literal(s, "single_case", single, false);
    }
    if let Some(compound) = &runner.case_settings.compound_case {
        case_literal(s, "compound_case", compound, true);
    }
    if let Some(review) = &runner.case_settings.review_compound {
        case_literal(s, "review_compound", review, true);
    }
}

fn case_literal(s: &mut String, var: &str, case: &Case, compound: bool) {
    let _ = writeln!(s, "{var} = open_case({{");
    let _ = writeln!(s, "  'name' => '{}',", rb(&case.name));
    let _ = writeln!(s, "  'directory' => '{}',", rb(&case.directory));
    let _ = writeln!(s, "  'description' => '{}',", rb(&case.description));
    let _ = writeln!(s, "  'investigator' => '{}',", rb(&case.investigator));
    let _ = writeln!(s, "  'compound' => {compound},");
    if let Some(es) = &case.elastic_search {
        let _ = writeln!(s, "  'elasticSearchClusterName' => '{}',", rb(&es.cluster_name));
        let _ = writeln!(
            s,
            "  'elasticSearchTransportHosts' => '{}',",
            rb(&es.nuix_transport_host)
        );
    }
    let _ = writeln!(s, "}})");
}

fn start(s: &mut String) {
    s.push_str(
        "\nputs('STARTING RUNNER')\n\
         post('Start', {id: RUNNER_ID, runner: RUNNER, caseID: single_case.get_guid})\n\n",
    );
}

fn stage_block(s: &mut String, stage: &Stage, remote_scripts_dir: Option<&str>) {
    let id = stage.meta.id;
    let name = rb(&stage.name());
    let _ = write!(
        s,
        "begin\n\
         \x20 start_stage({id})\n\
         \x20 log_info({id}, '{name}', 'stage started')\n",
    );
    stage_body(s, stage, remote_scripts_dir);
    let _ = write!(
        s,
        "\x20 finish_stage({id})\n\
         \x20 log_info({id}, '{name}', 'stage finished')\n\
         rescue => e\n\
         \x20 tear_down(single_case, compound_case, review_compound)\n\
         \x20 failed_stage({id})\n\
         \x20 log_error({id}, '{name}', 'stage failed', e.to_s)\n\
         \x20 raise\n\
         end\n\n",
    );
}

fn stage_body(s: &mut String, stage: &Stage, remote_scripts_dir: Option<&str>) {
    match &stage.kind {
        StageKind::Process(p) => {
            let _ = writeln!(s, "  processor = single_case.create_processor");
            if !p.profile.is_empty() {
                let _ = writeln!(
                    s,
                    "  processor.set_processing_profile('{}')",
                    rb(&p.profile)
                );
            }
            for evidence in &p.evidence_store {
                let _ = writeln!(
                    s,
                    "  container = processor.new_evidence_container('{}')",
                    rb(&evidence.name)
                );
                let _ = writeln!(s, "  container.add_file('{}')", rb(&evidence.directory));
                if !evidence.encoding.is_empty() {
                    let _ = writeln!(s, "  container.set_encoding('{}')", rb(&evidence.encoding));
                }
                if !evidence.time_zone.is_empty() {
                    let _ = writeln!(s, "  container.set_time_zone('{}')", rb(&evidence.time_zone));
                }
                if !evidence.custodian.is_empty() {
                    let _ = writeln!(
                        s,
                        "  container.set_initial_custodian('{}')",
                        rb(&evidence.custodian)
                    );
                }
                if !evidence.locale.is_empty() {
                    let _ = writeln!(s, "  container.set_locale('{}')", rb(&evidence.locale));
                }
                let _ = writeln!(s, "  container.save");
            }
            let _ = writeln!(s, "  processor.process");
        }
        StageKind::SearchAndTag(sat) => {
            if sat.search.is_empty() {
                for file in &sat.files {
                    let _ = writeln!(
                        s,
                        "  $utilities.get_bulk_annotater.add_tags_from_file(single_case, '{}')",
                        rb(&file.path)
                    );
                }
            } else {
                let _ = writeln!(s, "  items = single_case.search('{}')", rb(&sat.search));
                let _ = writeln!(
                    s,
                    "  $utilities.get_bulk_annotater.add_tag('{}', items)",
                    rb(&sat.tag)
                );
            }
        }
        StageKind::Exclude(e) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&e.search));
            let _ = writeln!(
                s,
                "  $utilities.get_bulk_annotater.exclude('{}', items)",
                rb(&e.reason)
            );
        }
        StageKind::Ocr(o) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&o.search));
            let _ = writeln!(s, "  ocr = $utilities.create_ocr_processor");
            let _ = writeln!(s, "  ocr.set_ocr_profile('{}')", rb(&o.profile));
            let _ = writeln!(
                s,
                "  items.each_slice({}) {{ |batch| ocr.process(batch) }}",
                o.batch_size
            );
        }
        StageKind::Reload(r) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&r.search));
            let _ = writeln!(s, "  processor = single_case.create_processor");
            let _ = writeln!(
                s,
                "  processor.set_processing_profile('{}')",
                rb(&r.profile)
            );
            let _ = writeln!(s, "  processor.reload_items_from_source_data(items)");
        }
        StageKind::Populate(p) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&p.search));
            let types = p
                .types
                .iter()
                .map(|t| format!("'{}'", rb(&t.kind)))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                s,
                "  single_case.get_binary_store.populate_stores(items, [{types}])"
            );
        }
        StageKind::InApp(inapp) => {
            let dir = remote_scripts_dir.unwrap_or(".");
            let settings = inapp
                .settings
                .as_ref()
                .and_then(|cfg| serde_json::to_string(cfg).ok())
                .unwrap_or_else(|| "{}".to_string());
            let _ = writeln!(s, "  settings = JSON.parse('{}')", rb(&settings));
            let _ = writeln!(s, "  load '{}/{}.rb'", rb(dir), rb(&inapp.name));
            let _ = writeln!(s, "  run_in_app(single_case, settings)");
        }
        StageKind::SyncDescendants(sd) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&sd.search));
            let _ = writeln!(
                s,
                "  items.each {{ |item| item.get_children.each {{ |child| child.sync_metadata }} }}"
            );
        }
        StageKind::ScanNewChildItems(sc) => {
            let _ = writeln!(s, "  items = single_case.search('{}')", rb(&sc.search));
            let _ = writeln!(s, "  processor = single_case.create_processor");
            if !sc.profile.is_empty() {
                let _ = writeln!(
                    s,
                    "  processor.set_processing_profile('{}')",
                    rb(&sc.profile)
                );
            }
            let _ = writeln!(s, "  processor.rescan_evidence_repositories(items)");
        }
    }
}

fn finish(s: &mut String) {
    s.push_str(
        "tear_down(single_case, compound_case, review_compound)\n\
         \n\
         post('Finish', {id: RUNNER_ID, runner: RUNNER})\n\
         puts('FINISHED RUNNER')\n\
         @heartbeat.kill\n\
         rescue => e\n\
         \x20 STDERR.puts(\"runner failed: #{e}\")\n\
         \x20 tear_down(single_case, compound_case, review_compound)\n\
         \x20 post('Failed', {id: RUNNER_ID, runner: RUNNER, exception: \"#{e.class}: #{e.message}\"})\n\
         \x20 @heartbeat.kill\n\
         \x20 exit(false)\n\
         end\n",
    );
}

/// Escape a string for a single-quoted ruby literal.
fn rb(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
